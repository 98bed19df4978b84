use std::fmt;

use crate::core::config::ytdlp;
use crate::download::quality::QualityLabel;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadTarget {
    Audio,
    Video(QualityLabel),
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadTarget::Audio => write!(f, "audio"),
            DownloadTarget::Video(quality) => write!(f, "{}", quality),
        }
    }
}

/// Post-processing the extractor applies after fetching streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postprocess {
    /// Transcode to a single audio codec.
    ExtractAudio { codec: &'static str, quality: &'static str },
    /// Merge and convert into one container.
    MuxVideo { container: &'static str },
}

/// Instructions for one extractor download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    pub target: DownloadTarget,
    /// yt-dlp format selector, alternatives separated by `/`
    pub format_selector: String,
    pub postprocess: Postprocess,
    pub retries: u32,
    pub fragment_retries: u32,
    pub skip_unavailable_fragments: bool,
}

impl DownloadSpec {
    /// Extension of the file the extractor leaves behind.
    pub fn output_extension(&self) -> &'static str {
        match self.postprocess {
            Postprocess::ExtractAudio { codec, .. } => codec,
            Postprocess::MuxVideo { container } => container,
        }
    }
}

/// Derives the download instructions for a target.
///
/// Video prefers the best video-only stream capped at the target height plus
/// the best audio, and falls back to the best combined stream under the cap.
pub fn build_spec(target: DownloadTarget) -> DownloadSpec {
    let (format_selector, postprocess) = match target {
        DownloadTarget::Audio => (
            "bestaudio/best".to_string(),
            Postprocess::ExtractAudio {
                codec: ytdlp::AUDIO_CODEC,
                quality: ytdlp::AUDIO_QUALITY,
            },
        ),
        DownloadTarget::Video(quality) => {
            let h = quality.height();
            (
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
                Postprocess::MuxVideo {
                    container: ytdlp::VIDEO_CONTAINER,
                },
            )
        }
    };

    DownloadSpec {
        target,
        format_selector,
        postprocess,
        retries: ytdlp::RETRIES,
        fragment_retries: ytdlp::FRAGMENT_RETRIES,
        skip_unavailable_fragments: true,
    }
}
