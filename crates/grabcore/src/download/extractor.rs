//! Boundary to the external media extraction tool.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::download::error::ExtractorError;
use crate::download::spec::DownloadSpec;

/// Metadata returned by a probe (no payload transferred).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    pub title: String,
    /// Heights of streams that carry video
    pub heights: BTreeSet<u32>,
}

/// Result of a finished download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Title reported by the extractor, when it printed one
    pub title: Option<String>,
}

/// A media extraction backend.
///
/// Implementations must not block the async runtime: run external processes
/// with `tokio::process` or move blocking work off the runtime.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Human-readable backend name (e.g. "yt-dlp")
    fn name(&self) -> &str;

    /// Fetches metadata only.
    async fn probe(&self, url: &str) -> Result<ProbeInfo, ExtractorError>;

    /// Downloads according to `spec`, writing to `output_template`.
    ///
    /// The template's file stem is a unique id followed by `.%(ext)s`; the
    /// produced file name starts with that id.
    async fn download(
        &self,
        url: &str,
        spec: &DownloadSpec,
        output_template: &Path,
    ) -> Result<DownloadOutcome, ExtractorError>;
}
