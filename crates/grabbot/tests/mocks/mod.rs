//! Mock implementations for conversation tests
//!
//! Stand-ins for yt-dlp that never touch the network.

pub mod fake_extractor;

#[allow(unused_imports)]
pub use fake_extractor::FakeExtractor;
