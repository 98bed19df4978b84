//! Standard quality labels and matching them against what a video offers.

use std::collections::BTreeSet;
use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Fixed, height-ordered set of selectable qualities.
///
/// Declaration order is ascending height, so the derived `Ord` sorts by height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum QualityLabel {
    #[strum(serialize = "144p")]
    P144,
    #[strum(serialize = "240p")]
    P240,
    #[strum(serialize = "360p")]
    P360,
    #[strum(serialize = "480p")]
    P480,
    #[strum(serialize = "720p")]
    P720,
    #[strum(serialize = "1080p")]
    P1080,
    #[strum(serialize = "1440p")]
    P1440,
    #[strum(serialize = "2160p")]
    P2160,
}

impl QualityLabel {
    /// Canonical pixel height.
    pub fn height(self) -> u32 {
        match self {
            Self::P144 => 144,
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
            Self::P1440 => 1440,
            Self::P2160 => 2160,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// All labels, ascending.
    pub fn all() -> Vec<QualityLabel> {
        Self::iter().collect()
    }

    /// Maximum distance (in pixels) at which a stream still counts as this quality.
    fn tolerance(self) -> f64 {
        (f64::from(self.height()) * 0.1).max(50.0)
    }

    fn matches(self, stream_height: u32) -> bool {
        (f64::from(stream_height) - f64::from(self.height())).abs() <= self.tolerance()
    }
}

/// Offered when the metadata probe fails.
pub const DEFAULT_QUALITIES: [QualityLabel; 6] = [
    QualityLabel::P144,
    QualityLabel::P240,
    QualityLabel::P360,
    QualityLabel::P480,
    QualityLabel::P720,
    QualityLabel::P1080,
];

/// Assumed best height when a video reports no video streams at all.
const ASSUMED_MAX_HEIGHT: u32 = 720;

/// Labels worth offering for a video with the given stream heights.
///
/// A label is offered when some stream lies within `max(height * 0.1, 50)`
/// pixels of it. If nothing matches, every label up to the tallest stream
/// (720 when there are no streams) is offered instead. Output is ascending.
pub fn available_qualities(stream_heights: &BTreeSet<u32>) -> Vec<QualityLabel> {
    let matched: Vec<QualityLabel> = QualityLabel::iter()
        .filter(|label| stream_heights.iter().any(|&h| label.matches(h)))
        .collect();

    if !matched.is_empty() {
        return matched;
    }

    let max_height = stream_heights.last().copied().unwrap_or(ASSUMED_MAX_HEIGHT);
    QualityLabel::iter().filter(|label| label.height() <= max_height).collect()
}

/// Resolves qualities from a probe result, degrading to [`DEFAULT_QUALITIES`]
/// when the probe failed or nothing at all could be offered.
pub fn available_qualities_or_default<E: fmt::Display>(stream_heights: Result<&BTreeSet<u32>, E>) -> Vec<QualityLabel> {
    match stream_heights {
        Ok(heights) => {
            let labels = available_qualities(heights);
            if labels.is_empty() {
                log::warn!("No quality fits stream heights {:?}, offering defaults", heights);
                DEFAULT_QUALITIES.to_vec()
            } else {
                labels
            }
        }
        Err(e) => {
            log::warn!("Quality probe failed, offering defaults: {}", e);
            DEFAULT_QUALITIES.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use QualityLabel::*;

    fn heights(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    fn assert_strictly_ascending(labels: &[QualityLabel]) {
        for pair in labels.windows(2) {
            assert!(pair[0].height() < pair[1].height(), "{:?} not ascending", labels);
        }
    }

    #[test]
    fn test_label_parsing_and_display() {
        assert_eq!(QualityLabel::from_str("1080p").unwrap(), P1080);
        assert_eq!(P2160.to_string(), "2160p");
        assert_eq!(P360.as_str(), "360p");
        assert!(QualityLabel::from_str("999p").is_err());
    }

    #[test]
    fn test_order_follows_height() {
        let all = QualityLabel::all();
        assert_eq!(all.len(), 8);
        assert_strictly_ascending(&all);
        assert!(P144 < P2160);
    }

    #[test]
    fn test_common_heights() {
        assert_eq!(available_qualities(&heights(&[360, 480, 720])), vec![P360, P480, P720]);
    }

    #[test]
    fn test_tolerance_window() {
        // 1080 +/- 108 covers 1000; 720 +/- 72 does not.
        assert_eq!(available_qualities(&heights(&[1000])), vec![P1080]);
        // Small labels use the 50px floor: 192 is within 50 of both 144 and 240.
        assert_eq!(available_qualities(&heights(&[192])), vec![P144, P240]);
        // Non-standard height close to 4K.
        assert_eq!(available_qualities(&heights(&[2000])), vec![P2160]);
    }

    #[test]
    fn test_full_ladder() {
        let all = heights(&[144, 240, 360, 480, 720, 1080, 1440, 2160]);
        assert_eq!(available_qualities(&all), QualityLabel::all());
    }

    #[test]
    fn test_empty_heights_fall_back_to_720() {
        assert_eq!(available_qualities(&BTreeSet::new()), vec![P144, P240, P360, P480, P720]);
    }

    #[test]
    fn test_unmatched_heights_fall_back_to_max() {
        // 600 is outside every window (480+/-50, 720+/-72).
        assert_eq!(available_qualities(&heights(&[600])), vec![P144, P240, P360, P480]);
    }

    #[test]
    fn test_output_is_ascending_without_duplicates() {
        for set in [
            heights(&[2160, 144]),
            heights(&[1, 2, 3]),
            heights(&[700, 710, 720, 730]),
            heights(&[5000]),
        ] {
            let labels = available_qualities(&set);
            assert_strictly_ascending(&labels);
        }
    }

    #[test]
    fn test_probe_failure_degrades_to_defaults() {
        let labels = available_qualities_or_default(Err::<&BTreeSet<u32>, _>("network down"));
        assert_eq!(labels, DEFAULT_QUALITIES.to_vec());
    }

    #[test]
    fn test_nothing_offered_degrades_to_defaults() {
        // Streams smaller than every label produce an empty list.
        assert!(available_qualities(&heights(&[50])).is_empty());
        let tiny = heights(&[50]);
        assert_eq!(available_qualities_or_default(Ok::<_, String>(&tiny)), DEFAULT_QUALITIES.to_vec());
    }
}
