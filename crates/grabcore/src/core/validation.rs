//! Link recognition
//!
//! Decides whether a pasted message is a YouTube link and derives the compact
//! form that is carried inside button payloads.

use lazy_regex::{lazy_regex, Lazy, Regex};

/// Host substrings accepted without further inspection.
const KNOWN_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Known path shapes followed by an 11-character video id.
static VIDEO_LINK: Lazy<Regex> = lazy_regex!(
    r"^(?:https?://)?(?:www\.)?(?:youtube\.com/(?:watch\?v=|embed/|v/)|youtu\.be/)([a-zA-Z0-9_-]{11})(?:\S+)?"
);

/// Strips surrounding whitespace and any leading `@` mentions.
///
/// ```
/// use grabcore::core::validation::normalize_input;
///
/// assert_eq!(normalize_input("  @ https://youtu.be/x "), "https://youtu.be/x");
/// ```
pub fn normalize_input(text: &str) -> &str {
    text.trim().trim_start_matches(|c: char| c == '@' || c.is_whitespace())
}

/// Returns `true` when the text looks like a YouTube link.
///
/// Never fails: anything unrecognized is simply `false`. Text starting with
/// `-` is refused so it can never reach yt-dlp as an option.
pub fn is_supported_link(text: &str) -> bool {
    let text = normalize_input(text);
    if text.is_empty() || text.starts_with('-') {
        return false;
    }
    KNOWN_HOSTS.iter().any(|host| text.contains(host)) || VIDEO_LINK.is_match(text)
}

/// Extracts the 11-character video id when the link has a known path shape.
pub fn video_id(text: &str) -> Option<&str> {
    VIDEO_LINK
        .captures(normalize_input(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Shortest equivalent link for a recognized video, otherwise the normalized input.
///
/// Button payloads are limited to 64 bytes, so links are shortened to
/// `https://youtu.be/<id>` whenever the id is known.
pub fn canonical_link(text: &str) -> String {
    match video_id(text) {
        Some(id) => format!("https://youtu.be/{}", id),
        None => normalize_input(text).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_hosts_accepted() {
        let links = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtube.com/shorts/abc",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=10",
            "check this youtube.com thing",
            "  @youtu.be/dQw4w9WgXcQ  ",
        ];
        for link in links {
            assert!(is_supported_link(link), "{link} should be accepted");
        }
    }

    #[test]
    fn test_unrelated_text_rejected() {
        let texts = [
            "",
            "   ",
            "@@@",
            "hello there",
            "https://vimeo.com/123456",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "youtube dot com",
            "--batch-file=/tmp/youtube.com",
            "-o /tmp/x youtu.be/dQw4w9WgXcQ",
            "http://169.254.169.254/latest",
        ];
        for text in texts {
            assert!(!is_supported_link(text), "{text:?} should be rejected");
        }
    }

    #[test]
    fn test_malformed_input_does_not_panic() {
        assert!(!is_supported_link("\u{0}\u{1}💥"));
        assert!(!is_supported_link(&"x".repeat(10_000)));
    }

    #[test]
    fn test_video_id_extraction() {
        assert_eq!(video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id("youtube.com/embed/dQw4w9WgXcQ?rel=0"), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id("http://youtube.com/v/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id("@ youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), None);
        assert_eq!(video_id("https://youtu.be/short"), None);
    }

    #[test]
    fn test_canonical_link() {
        assert_eq!(
            canonical_link(" https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123&index=4 "),
            "https://youtu.be/dQw4w9WgXcQ"
        );
        assert_eq!(
            canonical_link("@https://youtube.com/shorts/abc"),
            "https://youtube.com/shorts/abc"
        );
    }
}
