//! Core library for grabtube.
//!
//! Everything here is independent of the chat transport: link recognition,
//! quality resolution, the yt-dlp boundary, the fetcher and its worker pool,
//! transient file handling, user preferences and localized strings.

pub mod core;
pub mod download;
pub mod i18n;
pub mod keyboard;
pub mod payload;
pub mod storage;

pub use crate::core::config::Config;
pub use crate::core::phase::{PhaseTracker, RequestPhase};
pub use crate::core::validation::{canonical_link, is_supported_link, normalize_input};
pub use crate::download::{
    available_qualities, available_qualities_or_default, build_spec, cleanup, sweep_leftovers, DownloadSpec, DownloadTarget,
    DownloadedFile, FetchError, MediaExtractor, MediaFetcher, ProbeError, QualityLabel, TransientFile, VideoRef,
    WorkerPool, YtDlpExtractor,
};
pub use crate::payload::{CallbackPayload, MediaKind};
pub use crate::storage::prefs::PreferenceStore;
