//! Media acquisition.
//!
//! - `quality`: standard quality labels and the availability resolver
//! - `spec`: what to ask the extractor for
//! - `extractor` / `ytdlp`: the external extraction boundary
//! - `fetcher`: probe and fetch on top of an extractor
//! - `worker`: bounded pool the fetches run on
//! - `lifecycle`: transient file release

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod lifecycle;
pub mod quality;
pub mod spec;
pub mod worker;
pub mod ytdlp;
pub mod ytdlp_errors;

pub use error::{ExtractorError, FetchError, ProbeError};
pub use extractor::{DownloadOutcome, MediaExtractor, ProbeInfo};
pub use fetcher::{DownloadedFile, MediaFetcher, VideoRef};
pub use lifecycle::{cleanup, sweep_leftovers, TransientFile};
pub use quality::{available_qualities, available_qualities_or_default, QualityLabel, DEFAULT_QUALITIES};
pub use spec::{build_spec, DownloadSpec, DownloadTarget, Postprocess};
pub use worker::{WorkerHandle, WorkerPool};
pub use ytdlp::YtDlpExtractor;
pub use ytdlp_errors::{analyze_ytdlp_error, ExtractorFailureKind};
