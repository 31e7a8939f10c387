//! Chat delivery for schedule notifications.
//!
//! This crate provides:
//! - `ChatTransport` trait with a typed blocked/transient `DeliveryError`
//! - Telegram Bot API transport and `getUpdates` listener
//! - `Broadcaster` fanning a message out with per-recipient isolation
//! - Minijinja message templates

pub mod broadcaster;
pub mod telegram;
pub mod templating;
pub mod traits;
pub mod updates;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use telegram::TelegramTransport;
pub use templating::{MessageRenderer, CHECK_BUTTON_LABEL};
pub use traits::{
    ChatTransport, CommandSpec, DeliveryError, DeliveryResult, InboundCommand, ParseMode,
    ReplyKeyboard, SendOptions,
};
pub use updates::spawn_update_listener;
