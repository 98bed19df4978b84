//! Conversation orchestrator.
//!
//! Turns inbound chat events into prompts, downloads and deliveries:
//!
//! ```text
//! link ──> processing ──probe──> format menu ──audio──────────────┐
//!                                    │                            v
//!                                    └─video──> quality menu ──> downloading ──> uploading ──> complete
//! ```
//!
//! Every prompt after the first is an edit of the same bot message, which also
//! identifies the request for [`PhaseTracker`].

use std::sync::Arc;
use std::time::Duration;

use grabcore::core::phase::{PhaseTracker, RequestKey, RequestPhase};
use grabcore::core::validation::{is_supported_link, normalize_input};
use grabcore::download::{
    available_qualities_or_default, build_spec, DownloadTarget, MediaFetcher, TransientFile,
};
use grabcore::i18n::{self, error_text, t};
use grabcore::keyboard::{format_keyboard, language_keyboard, quality_keyboard, Keyboard};
use grabcore::payload::{CallbackPayload, MediaKind};
use grabcore::storage::PreferenceStore;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

use crate::telegram::bot::Command;
use crate::telegram::transport::{ChatTransport, TransportError};
use crate::throttle::DebounceGate;

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: u64,
    pub username: Option<String>,
}

/// An inbound chat event, decoded at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        from: Sender,
        chat_id: i64,
        command: Command,
    },
    Text {
        from: Sender,
        chat_id: i64,
        text: String,
    },
    Button {
        from: Sender,
        chat_id: i64,
        /// The bot message carrying the pressed keyboard
        message_id: i32,
        callback_id: String,
        data: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Command { from, .. } | Self::Text { from, .. } | Self::Button { from, .. } => from,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Command { chat_id, .. } | Self::Text { chat_id, .. } | Self::Button { chat_id, .. } => *chat_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The chat refused a finished file.
#[derive(Debug, Error)]
#[error("delivery of '{file}' failed: {source}")]
pub struct DeliveryError {
    pub file: String,
    #[source]
    pub source: TransportError,
}

/// How long a finished request is remembered to refuse late button presses.
const TOMBSTONE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct Conversation {
    transport: Arc<dyn ChatTransport>,
    fetcher: MediaFetcher,
    prefs: Arc<PreferenceStore>,
    phases: PhaseTracker,
    message_gate: DebounceGate,
    callback_gate: DebounceGate,
    log_events: bool,
}

impl Conversation {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        fetcher: MediaFetcher,
        prefs: Arc<PreferenceStore>,
        message_gate: DebounceGate,
        callback_gate: DebounceGate,
    ) -> Self {
        Self {
            transport,
            fetcher,
            prefs,
            phases: PhaseTracker::new(),
            message_gate,
            callback_gate,
            log_events: false,
        }
    }

    /// Logs every accepted inbound event at info level.
    pub fn with_event_logging(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    pub fn phases(&self) -> &PhaseTracker {
        &self.phases
    }

    /// Periodic cleanup: expired debounce entries and old finished requests.
    pub async fn housekeeping(&self) {
        self.message_gate.prune().await;
        self.callback_gate.prune().await;
        self.phases.prune(TOMBSTONE_TTL);
    }

    /// Handles one event; failures end in a generic error message, never a panic.
    pub async fn dispatch(&self, event: InboundEvent) {
        let chat_id = event.chat_id();
        let user_id = event.sender().id;

        if let Err(e) = self.handle(event).await {
            log::error!("Unexpected failure in chat {} (user {}): {}", chat_id, user_id, e);
            let lang = self.lang(user_id);
            let text = error_text(&lang, &t(&lang, "unexpected-error"));
            if let Err(e) = self.transport.send_text(chat_id, &text, None).await {
                log::error!("Could not report failure to chat {}: {}", chat_id, e);
            }
        }
    }

    /// Handles one event, returning transport failures to the caller.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), ConversationError> {
        let gate = match &event {
            InboundEvent::Button { .. } => &self.callback_gate,
            _ => &self.message_gate,
        };
        if !gate.try_pass(event.sender().id).await {
            log::debug!("Dropping event from user {} inside debounce window", event.sender().id);
            return Ok(());
        }

        if self.log_events {
            log_event(&event);
        }

        match event {
            InboundEvent::Command { from, chat_id, command } => self.on_command(&from, chat_id, command).await,
            InboundEvent::Text { from, chat_id, text } => self.on_text(&from, chat_id, &text).await,
            InboundEvent::Button {
                from,
                chat_id,
                message_id,
                callback_id,
                data,
            } => self.on_button(&from, chat_id, message_id, &callback_id, &data).await,
        }
    }

    fn lang(&self, user_id: u64) -> LanguageIdentifier {
        i18n::lang_from_code(&self.prefs.language(user_id))
    }

    async fn on_command(&self, from: &Sender, chat_id: i64, command: Command) -> Result<(), ConversationError> {
        let lang = self.lang(from.id);
        log::info!("Command {:?} from user {}", command, from.id);

        match command {
            Command::Start => {
                self.transport
                    .send_text(chat_id, &t(&lang, "welcome"), Some(&language_keyboard()))
                    .await?;
            }
            Command::Help => {
                self.transport.send_text(chat_id, &t(&lang, "help"), None).await?;
            }
            Command::Language => {
                self.transport
                    .send_text(chat_id, &t(&lang, "select-language"), Some(&language_keyboard()))
                    .await?;
            }
        }
        Ok(())
    }

    async fn on_text(&self, from: &Sender, chat_id: i64, text: &str) -> Result<(), ConversationError> {
        let text = normalize_input(text);
        let lang = self.lang(from.id);

        if is_supported_link(text) {
            return self.start_request(chat_id, &lang, text).await;
        }

        if let Some(code) = i18n::language_by_label(text) {
            self.prefs.set_language(from.id, code);
            let lang = i18n::lang_from_code(code);
            self.transport
                .send_text(chat_id, &t(&lang, "language-selected"), None)
                .await?;
            return Ok(());
        }

        self.transport.send_text(chat_id, &t(&lang, "invalid-url"), None).await?;
        Ok(())
    }

    /// Probes a freshly pasted link and offers the format menu.
    async fn start_request(&self, chat_id: i64, lang: &LanguageIdentifier, url: &str) -> Result<(), ConversationError> {
        let message_id = self.transport.send_text(chat_id, &t(lang, "processing"), None).await?;
        let key = RequestKey::new(chat_id, message_id);
        self.phases.record(key, RequestPhase::Probing);

        match self.fetcher.probe(url).await {
            Ok(video) => {
                log::info!("Probed '{}' ({} stream heights)", video.title, video.heights.len());
                self.phases.record(key, RequestPhase::AwaitingFormatChoice);
                self.edit(key, &t(lang, "select-format"), Some(&format_keyboard(lang, &video.url)))
                    .await
            }
            Err(e) => {
                self.phases.record(key, RequestPhase::Failed);
                self.edit(key, &error_text(lang, &e.to_string()), None).await
            }
        }
    }

    async fn on_button(
        &self,
        from: &Sender,
        chat_id: i64,
        message_id: i32,
        callback_id: &str,
        data: &str,
    ) -> Result<(), ConversationError> {
        if let Err(e) = self.transport.answer_callback(callback_id).await {
            log::warn!("Failed to answer callback {}: {}", callback_id, e);
        }

        let payload = match CallbackPayload::parse(data) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Ignoring button data {:?} from user {}: {}", data, from.id, e);
                return Ok(());
            }
        };

        let key = RequestKey::new(chat_id, message_id);
        let lang = self.lang(from.id);

        // Button data comes from the client and is not trusted.
        if let Some(url) = payload.link() {
            if !is_supported_link(url) {
                log::warn!("Rejecting button link {:?} from user {}", url, from.id);
                return self.edit(key, &t(&lang, "invalid-url"), None).await;
            }
        }

        match payload {
            CallbackPayload::Language(code) => {
                self.prefs.set_language(from.id, &code);
                let lang = self.lang(from.id);
                self.edit(key, &t(&lang, "language-selected"), None).await
            }
            CallbackPayload::FormatChoice {
                kind: MediaKind::Video,
                url,
            } => {
                if !self.enter(key, RequestPhase::AwaitingQualityChoice) {
                    return Ok(());
                }
                self.offer_qualities(key, &lang, &url).await
            }
            CallbackPayload::FormatChoice {
                kind: MediaKind::Audio,
                url,
            } => self.fetch_and_deliver(key, &lang, &url, DownloadTarget::Audio).await,
            CallbackPayload::QualityChoice { quality, url } => {
                self.fetch_and_deliver(key, &lang, &url, DownloadTarget::Video(quality))
                    .await
            }
            CallbackPayload::BackToFormat { url } => {
                if !self.enter(key, RequestPhase::AwaitingFormatChoice) {
                    return Ok(());
                }
                self.edit(key, &t(&lang, "select-format"), Some(&format_keyboard(&lang, &url)))
                    .await
            }
            CallbackPayload::Cancel => {
                if !self.enter(key, RequestPhase::Cancelled) {
                    return Ok(());
                }
                self.edit(key, &t(&lang, "operation-cancelled"), None).await
            }
        }
    }

    async fn offer_qualities(
        &self,
        key: RequestKey,
        lang: &LanguageIdentifier,
        url: &str,
    ) -> Result<(), ConversationError> {
        self.edit(key, &t(lang, "processing"), None).await?;

        let probe = self.fetcher.probe(url).await;
        let qualities = available_qualities_or_default(probe.as_ref().map(|video| &video.heights));
        let url = probe.as_ref().map_or(url, |video| video.url.as_str());

        self.edit(key, &t(lang, "select-quality"), Some(&quality_keyboard(lang, url, &qualities)))
            .await
    }

    /// Downloads, uploads and always releases the file afterwards.
    async fn fetch_and_deliver(
        &self,
        key: RequestKey,
        lang: &LanguageIdentifier,
        url: &str,
        target: DownloadTarget,
    ) -> Result<(), ConversationError> {
        if !self.enter(key, RequestPhase::Fetching) {
            return Ok(());
        }
        self.edit(key, &t(lang, "downloading"), None).await?;

        let file = match self.fetcher.fetch(url, build_spec(target)).await {
            Ok(file) => file,
            Err(e) => {
                log::error!("Fetch of {} as {} failed ({}): {}", url, target, e.subcategory(), e);
                self.phases.record(key, RequestPhase::Failed);
                let reason = match target {
                    DownloadTarget::Audio => t(lang, "failed-audio"),
                    DownloadTarget::Video(_) => t(lang, "failed-video"),
                };
                return self.edit(key, &error_text(lang, &reason), None).await;
            }
        };

        self.phases.record(key, RequestPhase::Delivering);
        self.edit(key, &t(lang, "uploading"), None).await?;

        let delivered = self.deliver(key.chat_id, &file, target).await;
        file.release();

        match delivered {
            Ok(()) => {
                self.phases.record(key, RequestPhase::Done);
                self.edit(key, &t(lang, "download-complete"), None).await
            }
            Err(e) => {
                log::error!("{}", e);
                self.phases.record(key, RequestPhase::Failed);
                let text = match e.source {
                    TransportError::TooLarge => t(lang, "file-too-large"),
                    other => error_text(lang, &other.to_string()),
                };
                self.edit(key, &text, None).await
            }
        }
    }

    async fn deliver(&self, chat_id: i64, file: &TransientFile, target: DownloadTarget) -> Result<(), DeliveryError> {
        let sent = match target {
            DownloadTarget::Audio => {
                self.transport
                    .send_audio(chat_id, file.path(), file.display_name())
                    .await
            }
            DownloadTarget::Video(_) => {
                self.transport
                    .send_video(chat_id, file.path(), file.display_name())
                    .await
            }
        };
        sent.map_err(|source| DeliveryError {
            file: file.display_name().to_string(),
            source,
        })
    }

    /// Moves a request forward for a button press; `false` means the press is stale.
    fn enter(&self, key: RequestKey, next: RequestPhase) -> bool {
        match self.phases.advance(key, next) {
            Ok(_) => true,
            Err(e) => {
                log::info!("Ignoring press on request {}:{}: {}", key.chat_id, key.message_id, e);
                false
            }
        }
    }

    async fn edit(&self, key: RequestKey, text: &str, keyboard: Option<&Keyboard>) -> Result<(), ConversationError> {
        self.transport
            .edit_text(key.chat_id, key.message_id, text, keyboard)
            .await?;
        Ok(())
    }
}

fn log_event(event: &InboundEvent) {
    let from = event.sender();
    let username = from.username.as_deref().unwrap_or("-");
    match event {
        InboundEvent::Command { command, .. } => {
            log::info!("Command from user {} (@{}): {:?}", from.id, username, command)
        }
        InboundEvent::Text { text, .. } => log::info!("Message from user {} (@{}): {}", from.id, username, text),
        InboundEvent::Button { data, .. } => log::info!("Callback from user {} (@{}): {}", from.id, username, data),
    }
}
