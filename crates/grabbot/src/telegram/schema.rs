//! Dispatcher schema: maps Telegram updates onto [`InboundEvent`]s.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, User};

use super::bot::Command;
use super::types::{HandlerDeps, HandlerError};
use crate::conversation::{InboundEvent, Sender};

/// Builds the update handler tree used by the dispatcher.
///
/// Commands go first so `/start` never reaches the link handler.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(message_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn sender(user: &User) -> Sender {
    Sender {
        id: user.id.0,
        username: user.username.clone(),
    }
}

/// Hands the event to the conversation without blocking the chat's update queue.
fn spawn_dispatch(deps: &HandlerDeps, event: InboundEvent) {
    let conversation = Arc::clone(&deps.conversation);
    tokio::spawn(async move { conversation.dispatch(event).await });
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let Some(user) = msg.from.as_ref() else {
                    return Ok(());
                };
                spawn_dispatch(
                    &deps,
                    InboundEvent::Command {
                        from: sender(user),
                        chat_id: msg.chat.id.0,
                        command: cmd,
                    },
                );
                Ok(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some() && msg.from.is_some())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                if let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) {
                    spawn_dispatch(
                        &deps,
                        InboundEvent::Text {
                            from: sender(user),
                            chat_id: msg.chat.id.0,
                            text: text.to_string(),
                        },
                    );
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let origin = q.message.as_ref().map(|m| (m.chat().id.0, m.id().0));
            match (origin, q.data) {
                (Some((chat_id, message_id)), Some(data)) => spawn_dispatch(
                    &deps,
                    InboundEvent::Button {
                        from: sender(&q.from),
                        chat_id,
                        message_id,
                        callback_id: q.id.0,
                        data,
                    },
                ),
                _ => {
                    log::debug!("Callback {} without message or data, acknowledging only", q.id.0);
                    if let Err(e) = bot.answer_callback_query(q.id).await {
                        log::warn!("Failed to answer callback: {}", e);
                    }
                }
            }
            Ok(())
        }
    })
}
