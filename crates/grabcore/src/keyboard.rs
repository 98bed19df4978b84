//! Transport-neutral inline keyboards.

use unic_langid::LanguageIdentifier;

use crate::download::quality::QualityLabel;
use crate::i18n::{t, SUPPORTED_LANGS};
use crate::payload::{CallbackPayload, MediaKind};

/// Quality lists up to this size are laid out one per row.
const SINGLE_COLUMN_MAX: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub payload: CallbackPayload,
}

impl Button {
    pub fn new(text: impl Into<String>, payload: CallbackPayload) -> Self {
        Self {
            text: text.into(),
            payload,
        }
    }

    /// Callback data sent back by the client.
    pub fn data(&self) -> String {
        self.payload.encode()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// One supported language per row.
pub fn language_keyboard() -> Keyboard {
    let rows = SUPPORTED_LANGS
        .iter()
        .map(|(code, name)| vec![Button::new(*name, CallbackPayload::Language(code.to_string()))])
        .collect();
    Keyboard { rows }
}

/// Video, audio and cancel, one per row.
pub fn format_keyboard(lang: &LanguageIdentifier, url: &str) -> Keyboard {
    Keyboard {
        rows: vec![
            vec![Button::new(
                t(lang, "button-video"),
                CallbackPayload::FormatChoice {
                    kind: MediaKind::Video,
                    url: url.to_string(),
                },
            )],
            vec![Button::new(
                t(lang, "button-audio"),
                CallbackPayload::FormatChoice {
                    kind: MediaKind::Audio,
                    url: url.to_string(),
                },
            )],
            vec![cancel_button(lang)],
        ],
    }
}

/// Quality buttons followed by back and cancel rows.
///
/// Up to four qualities are shown one per row, more are paired. An empty list
/// offers every label.
pub fn quality_keyboard(lang: &LanguageIdentifier, url: &str, qualities: &[QualityLabel]) -> Keyboard {
    let qualities = if qualities.is_empty() {
        QualityLabel::all()
    } else {
        qualities.to_vec()
    };

    let buttons: Vec<Button> = qualities
        .iter()
        .map(|quality| {
            Button::new(
                t(lang, &format!("quality-{}", quality.as_str())),
                CallbackPayload::QualityChoice {
                    quality: *quality,
                    url: url.to_string(),
                },
            )
        })
        .collect();

    let per_row = if buttons.len() <= SINGLE_COLUMN_MAX { 1 } else { 2 };
    let mut rows: Vec<Vec<Button>> = buttons.chunks(per_row).map(<[Button]>::to_vec).collect();

    rows.push(vec![Button::new(
        t(lang, "button-back"),
        CallbackPayload::BackToFormat { url: url.to_string() },
    )]);
    rows.push(vec![cancel_button(lang)]);
    Keyboard { rows }
}

fn cancel_button(lang: &LanguageIdentifier) -> Button {
    Button::new(t(lang, "button-cancel"), CallbackPayload::Cancel)
}
