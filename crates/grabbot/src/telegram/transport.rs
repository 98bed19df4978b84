//! Outbound chat operations.
//!
//! The conversation only needs a handful of Bot API calls; they sit behind
//! [`ChatTransport`] so tests can record them instead of hitting Telegram.

use std::path::Path;

use async_trait::async_trait;
use grabcore::keyboard::Keyboard;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use teloxide::{ApiError, RequestError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Telegram refused the upload because of its size
    #[error("file is too large for Telegram")]
    TooLarge,

    #[error("Telegram error: {0}")]
    Request(RequestError),

    /// Rejection reported by a non-Telegram transport
    #[error("{0}")]
    Rejected(String),
}

impl From<RequestError> for TransportError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Api(ApiError::RequestEntityTooLarge) => TransportError::TooLarge,
            other => TransportError::Request(other),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a message and returns its id.
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i32, TransportError>;

    /// Replaces the text (and keyboard) of a message sent earlier.
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    async fn send_audio(&self, chat_id: i64, path: &Path, title: &str) -> Result<(), TransportError>;

    async fn send_video(&self, chat_id: i64, path: &Path, caption: &str) -> Result<(), TransportError>;

    /// Stops the client's loading indicator on a pressed button.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError>;
}

/// [`ChatTransport`] over a teloxide [`Bot`].
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: Bot,
}

impl TeloxideTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Converts the neutral keyboard model into Telegram markup.
pub fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| InlineKeyboardButton::callback(button.text.clone(), button.data()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl ChatTransport for TeloxideTransport {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i32, TransportError> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let message = match keyboard {
            Some(keyboard) => request.reply_markup(to_markup(keyboard)).await?,
            None => request.await?,
        };
        Ok(message.id.0)
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let request = self.bot.edit_message_text(ChatId(chat_id), MessageId(message_id), text);
        let result = match keyboard {
            Some(keyboard) => request.reply_markup(to_markup(keyboard)).await,
            None => request.await,
        };
        match result {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn send_audio(&self, chat_id: i64, path: &Path, title: &str) -> Result<(), TransportError> {
        self.bot
            .send_audio(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .title(title)
            .await?;
        Ok(())
    }

    async fn send_video(&self, chat_id: i64, path: &Path, caption: &str) -> Result<(), TransportError> {
        self.bot
            .send_video(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption)
            .supports_streaming(true)
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await?;
        Ok(())
    }
}
