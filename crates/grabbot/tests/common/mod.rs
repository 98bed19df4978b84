//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod recorder;

#[allow(unused_imports)]
pub use recorder::{Call, RecordingTransport, UploadFailure};
