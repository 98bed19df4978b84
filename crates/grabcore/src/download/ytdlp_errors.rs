//! Classification of yt-dlp failures from their stderr output.

use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ExtractorFailureKind {
    /// YouTube asked for a sign-in or otherwise blocked the request
    BotDetection,
    /// Private, removed or region-locked video
    VideoUnavailable,
    /// Timeouts, DNS or connection problems
    Network,
    /// Fragments could not be fetched even after retries
    Fragment,
    /// ffmpeg failed while converting or merging
    Postprocessing,
    Unknown,
}

/// Determines the failure kind from yt-dlp stderr.
pub fn analyze_ytdlp_error(stderr: &str) -> ExtractorFailureKind {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("sign in to confirm you're not a bot")
        || stderr_lower.contains("please sign in")
        || stderr_lower.contains("http error 403")
        || stderr_lower.contains("http error 429")
        || stderr_lower.contains("signature extraction failed")
    {
        return ExtractorFailureKind::BotDetection;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("video is not available")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("is not a valid url")
        || stderr_lower.contains("unsupported url")
    {
        return ExtractorFailureKind::VideoUnavailable;
    }

    if stderr_lower.contains("fragment") && stderr_lower.contains("giving up") {
        return ExtractorFailureKind::Fragment;
    }

    if stderr_lower.contains("postprocessing") || stderr_lower.contains("ffmpeg") || stderr_lower.contains("ffprobe")
    {
        return ExtractorFailureKind::Postprocessing;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("timeout")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("name resolution")
        || stderr_lower.contains("failed to connect")
    {
        return ExtractorFailureKind::Network;
    }

    ExtractorFailureKind::Unknown
}

/// The most relevant line of stderr: the last `ERROR:` line, else the last non-empty one.
pub fn error_summary(stderr: &str) -> &str {
    let lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    lines
        .clone()
        .filter_map(|l| l.strip_prefix("ERROR:"))
        .last()
        .map(str::trim)
        .or_else(|| lines.last())
        .unwrap_or("no output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_detection() {
        let stderr = "ERROR: [youtube] abc: Sign in to confirm you're not a bot. Use --cookies";
        assert_eq!(analyze_ytdlp_error(stderr), ExtractorFailureKind::BotDetection);
        assert_eq!(
            analyze_ytdlp_error("ERROR: unable to download video data: HTTP Error 403: Forbidden"),
            ExtractorFailureKind::BotDetection
        );
    }

    #[test]
    fn test_video_unavailable() {
        for stderr in [
            "ERROR: [youtube] abc: Private video. Sign in if you've been granted access",
            "ERROR: [youtube] abc: Video unavailable",
            "ERROR: [generic] 'hello' is not a valid URL",
        ] {
            assert_eq!(analyze_ytdlp_error(stderr), ExtractorFailureKind::VideoUnavailable, "{stderr}");
        }
    }

    #[test]
    fn test_fragment_and_postprocessing() {
        assert_eq!(
            analyze_ytdlp_error("ERROR: fragment 12 not found, giving up after 10 retries"),
            ExtractorFailureKind::Fragment
        );
        assert_eq!(
            analyze_ytdlp_error("ERROR: Postprocessing: audio conversion failed"),
            ExtractorFailureKind::Postprocessing
        );
    }

    #[test]
    fn test_network() {
        assert_eq!(
            analyze_ytdlp_error("ERROR: Unable to download webpage: <urlopen error [Errno -3] Temporary failure in name resolution>"),
            ExtractorFailureKind::Network
        );
        assert_eq!(analyze_ytdlp_error("read operation timed out"), ExtractorFailureKind::Network);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(analyze_ytdlp_error("something odd"), ExtractorFailureKind::Unknown);
        assert_eq!(analyze_ytdlp_error(""), ExtractorFailureKind::Unknown);
    }

    #[test]
    fn test_error_summary() {
        let stderr = "WARNING: a\nERROR: first\n[info] noise\nERROR: [youtube] x: Video unavailable\n";
        assert_eq!(error_summary(stderr), "[youtube] x: Video unavailable");
        assert_eq!(error_summary("just text\n\n"), "just text");
        assert_eq!(error_summary(""), "no output");
    }
}
