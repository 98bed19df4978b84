//! Telegram side: bot construction, dispatcher schema and the transport
//! adapter the conversation talks through.

pub mod bot;
pub mod schema;
pub mod transport;
pub mod types;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use schema::schema;
pub use transport::{ChatTransport, TeloxideTransport, TransportError};
pub use types::{HandlerDeps, HandlerError};
