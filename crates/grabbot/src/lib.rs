//! grabbot: the Telegram front end of grabtube.
//!
//! Telegram updates are decoded in [`telegram`] and handed to the
//! [`conversation::Conversation`], which talks back only through the
//! [`telegram::ChatTransport`] trait. Everything below that (probing,
//! downloading, preferences, texts) lives in `grabcore`.

pub mod cli;
pub mod conversation;
pub mod logging;
pub mod telegram;
pub mod throttle;

pub use conversation::{Conversation, InboundEvent, Sender};
pub use throttle::DebounceGate;
