use std::time::Duration;

use thiserror::Error;

use crate::download::ytdlp_errors::{error_summary, ExtractorFailureKind};

/// Failure of the external extraction tool.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The binary could not be started
    #[error("failed to start extractor: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("extractor timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The tool ran and reported an error
    #[error("{}", error_summary(.stderr))]
    Failed { kind: ExtractorFailureKind, stderr: String },

    /// Metadata output could not be parsed
    #[error("malformed extractor output: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ExtractorError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            ExtractorError::Spawn(_) => "spawn",
            ExtractorError::Timeout(_) => "timeout",
            ExtractorError::Failed { kind, .. } => kind.into(),
            ExtractorError::Malformed(_) => "malformed",
        }
    }
}

/// Metadata probe failed.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ProbeError(#[from] pub ExtractorError);

/// Download or output handling failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// The extractor reported success but left no `<id>*.<extension>` file
    #[error("no output file produced for {id} (.{extension})")]
    NoOutputFile { id: String, extension: &'static str },

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker task panicked before producing a result
    #[error("download worker stopped unexpectedly")]
    WorkerLost,
}

impl FetchError {
    pub fn subcategory(&self) -> &'static str {
        match self {
            FetchError::Extraction(e) => e.subcategory(),
            FetchError::NoOutputFile { .. } => "no_output_file",
            FetchError::Io(_) => "io",
            FetchError::WorkerLost => "worker_lost",
        }
    }
}
