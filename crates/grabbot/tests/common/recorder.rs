//! In-memory [`ChatTransport`] that records every outbound call.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use grabbot::telegram::{ChatTransport, TransportError};
use grabcore::keyboard::Keyboard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send {
        chat_id: i64,
        message_id: i32,
        text: String,
        /// Callback data of every button, row by row
        buttons: Vec<String>,
    },
    Edit {
        chat_id: i64,
        message_id: i32,
        text: String,
        buttons: Vec<String>,
    },
    Audio {
        chat_id: i64,
        title: String,
        /// Whether the file was on disk when it was handed over
        file_present: bool,
    },
    Video {
        chat_id: i64,
        caption: String,
        file_present: bool,
    },
    Answer {
        callback_id: String,
    },
}

/// How uploads should fail, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFailure {
    TooLarge,
    Rejected,
}

pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI32,
    upload_failure: Mutex<Option<UploadFailure>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(100),
            upload_failure: Mutex::new(None),
        }
    }

    pub fn fail_uploads(&self, failure: UploadFailure) {
        *self.upload_failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Text of every send and edit, in order.
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    /// Buttons of the most recent message that carried a keyboard.
    pub fn last_buttons(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Send { buttons, .. } | Call::Edit { buttons, .. } if !buttons.is_empty() => Some(buttons),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn uploads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Audio { .. } | Call::Video { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn upload_result(&self) -> Result<(), TransportError> {
        match *self.upload_failure.lock().unwrap() {
            None => Ok(()),
            Some(UploadFailure::TooLarge) => Err(TransportError::TooLarge),
            Some(UploadFailure::Rejected) => Err(TransportError::Rejected("upload refused".to_string())),
        }
    }
}

fn button_data(keyboard: Option<&Keyboard>) -> Vec<String> {
    keyboard
        .map(|keyboard| keyboard.buttons().map(|button| button.data()).collect())
        .unwrap_or_default()
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i32, TransportError> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.record(Call::Send {
            chat_id,
            message_id,
            text: text.to_string(),
            buttons: button_data(keyboard),
        });
        Ok(message_id)
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        self.record(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            buttons: button_data(keyboard),
        });
        Ok(())
    }

    async fn send_audio(&self, chat_id: i64, path: &Path, title: &str) -> Result<(), TransportError> {
        self.record(Call::Audio {
            chat_id,
            title: title.to_string(),
            file_present: path.exists(),
        });
        self.upload_result()
    }

    async fn send_video(&self, chat_id: i64, path: &Path, caption: &str) -> Result<(), TransportError> {
        self.record(Call::Video {
            chat_id,
            caption: caption.to_string(),
            file_present: path.exists(),
        });
        self.upload_result()
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.record(Call::Answer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}
