//! Button payload schema.
//!
//! Payloads are colon separated. The URL is always the last field and keeps
//! any colons it contains:
//!
//! | payload                      | meaning                   |
//! |------------------------------|---------------------------|
//! | `language:<tag>`             | switch language           |
//! | `format:<video|audio>:<url>` | pick output kind          |
//! | `quality:<label>:<url>`      | pick video quality        |
//! | `back_to_format:<url>`       | return to the format menu |
//! | `cancel`                     | abandon the request       |

use std::fmt;
use std::str::FromStr;

use strum::{Display, EnumString};
use thiserror::Error;

use crate::core::validation::normalize_input;
use crate::download::quality::QualityLabel;

/// Telegram rejects callback data longer than this (bytes).
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackPayload {
    Language(String),
    FormatChoice { kind: MediaKind, url: String },
    QualityChoice { quality: QualityLabel, url: String },
    BackToFormat { url: String },
    Cancel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("empty payload")]
    Empty,
    #[error("unknown payload prefix '{0}'")]
    UnknownPrefix(String),
    #[error("payload is missing its {0}")]
    MissingField(&'static str),
    #[error("unknown media kind '{0}'")]
    InvalidKind(String),
    #[error("unknown quality '{0}'")]
    InvalidQuality(String),
}

impl CallbackPayload {
    pub fn parse(data: &str) -> Result<Self, PayloadError> {
        let data = data.trim();
        if data.is_empty() {
            return Err(PayloadError::Empty);
        }

        let (prefix, rest) = match data.split_once(':') {
            Some((prefix, rest)) => (prefix, Some(rest)),
            None => (data, None),
        };

        match prefix {
            "cancel" => Ok(Self::Cancel),
            "language" => {
                let tag = required(rest, "language")?;
                Ok(Self::Language(tag.to_string()))
            }
            "format" => {
                let (kind, url) = split_field(required(rest, "media kind")?)?;
                let kind = MediaKind::from_str(kind).map_err(|_| PayloadError::InvalidKind(kind.to_string()))?;
                Ok(Self::FormatChoice { kind, url })
            }
            "quality" => {
                let (quality, url) = split_field(required(rest, "quality")?)?;
                let quality =
                    QualityLabel::from_str(quality).map_err(|_| PayloadError::InvalidQuality(quality.to_string()))?;
                Ok(Self::QualityChoice { quality, url })
            }
            "back_to_format" => Ok(Self::BackToFormat {
                url: link(required(rest, "url")?)?,
            }),
            other => Err(PayloadError::UnknownPrefix(other.to_string())),
        }
    }

    pub fn encode(&self) -> String {
        let data = match self {
            Self::Language(tag) => format!("language:{}", tag),
            Self::FormatChoice { kind, url } => format!("format:{}:{}", kind, url),
            Self::QualityChoice { quality, url } => format!("quality:{}:{}", quality, url),
            Self::BackToFormat { url } => format!("back_to_format:{}", url),
            Self::Cancel => "cancel".to_string(),
        };
        if data.len() > MAX_CALLBACK_DATA_LEN {
            log::warn!("Callback data is {} bytes, over Telegram's limit: {}", data.len(), data);
        }
        data
    }

    /// The video link a payload carries, if any.
    pub fn link(&self) -> Option<&str> {
        match self {
            Self::FormatChoice { url, .. } | Self::QualityChoice { url, .. } | Self::BackToFormat { url } => Some(url),
            Self::Language(_) | Self::Cancel => None,
        }
    }
}

impl FromStr for CallbackPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CallbackPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn required<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str, PayloadError> {
    field.filter(|f| !f.is_empty()).ok_or(PayloadError::MissingField(name))
}

/// Splits `<field>:<url>`, keeping colons of the URL.
fn split_field(rest: &str) -> Result<(&str, String), PayloadError> {
    let (field, url) = rest.split_once(':').ok_or(PayloadError::MissingField("url"))?;
    Ok((field, link(url)?))
}

fn link(raw: &str) -> Result<String, PayloadError> {
    let url = normalize_input(raw);
    if url.is_empty() {
        Err(PayloadError::MissingField("url"))
    } else {
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[test]
    fn test_parse_all_shapes() {
        assert_eq!(CallbackPayload::parse("cancel").unwrap(), CallbackPayload::Cancel);
        assert_eq!(
            CallbackPayload::parse("language:ru").unwrap(),
            CallbackPayload::Language("ru".into())
        );
        assert_eq!(
            CallbackPayload::parse(&format!("format:audio:{URL}")).unwrap(),
            CallbackPayload::FormatChoice {
                kind: MediaKind::Audio,
                url: URL.into()
            }
        );
        assert_eq!(
            CallbackPayload::parse(&format!("quality:720p:{URL}")).unwrap(),
            CallbackPayload::QualityChoice {
                quality: QualityLabel::P720,
                url: URL.into()
            }
        );
        assert_eq!(
            CallbackPayload::parse(&format!("back_to_format:{URL}")).unwrap(),
            CallbackPayload::BackToFormat { url: URL.into() }
        );
    }

    #[test]
    fn test_url_keeps_its_colons() {
        let payload = CallbackPayload::parse("format:video:http://host:8080/watch?v=a:b").unwrap();
        assert_eq!(
            payload,
            CallbackPayload::FormatChoice {
                kind: MediaKind::Video,
                url: "http://host:8080/watch?v=a:b".into()
            }
        );
    }

    #[test]
    fn test_url_leading_mentions_stripped() {
        let payload = CallbackPayload::parse("back_to_format:@ https://youtu.be/x").unwrap();
        assert_eq!(
            payload,
            CallbackPayload::BackToFormat {
                url: "https://youtu.be/x".into()
            }
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(CallbackPayload::parse("   "), Err(PayloadError::Empty));
        assert_eq!(
            CallbackPayload::parse("delete:everything"),
            Err(PayloadError::UnknownPrefix("delete".into()))
        );
        assert_eq!(CallbackPayload::parse("language:"), Err(PayloadError::MissingField("language")));
        assert_eq!(CallbackPayload::parse("format:video"), Err(PayloadError::MissingField("url")));
        assert_eq!(
            CallbackPayload::parse("format:gif:https://youtu.be/x"),
            Err(PayloadError::InvalidKind("gif".into()))
        );
        assert_eq!(
            CallbackPayload::parse("quality:8k:https://youtu.be/x"),
            Err(PayloadError::InvalidQuality("8k".into()))
        );
        assert_eq!(CallbackPayload::parse("quality:720p:"), Err(PayloadError::MissingField("url")));
    }

    #[test]
    fn test_encode_matches_wire_format() {
        let payload = CallbackPayload::QualityChoice {
            quality: QualityLabel::P1080,
            url: URL.into(),
        };
        assert_eq!(payload.encode(), format!("quality:1080p:{URL}"));
        assert_eq!(payload.to_string().parse::<CallbackPayload>().unwrap(), payload);
        assert!(payload.encode().len() <= MAX_CALLBACK_DATA_LEN);
    }

    #[test]
    fn test_link_accessor() {
        let payload = CallbackPayload::parse(&format!("back_to_format:{URL}")).unwrap();
        assert_eq!(payload.link(), Some(URL));
        assert_eq!(CallbackPayload::Cancel.link(), None);
        assert_eq!(CallbackPayload::Language("ru".into()).link(), None);
    }
}
