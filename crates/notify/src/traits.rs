//! Chat transport trait definition and shared delivery types.

use serde::{Deserialize, Serialize};
use svitlo_core::ChatId;

/// Errors that can occur while talking to the chat platform.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The recipient blocked the bot or the chat is gone (HTTP 403).
    #[error("recipient blocked the bot: {0}")]
    Blocked(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API error {status}: {description}")]
    Api { status: u16, description: String },

    #[error("delivery timed out after {0}s")]
    Timeout(u64),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeliveryError {
    /// Permanent failure; the recipient should be unsubscribed.
    pub fn is_blocked(&self) -> bool {
        matches!(self, DeliveryError::Blocked(_))
    }
}

/// Telegram legacy Markdown; every formatted message uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
}

/// A persistent reply keyboard: rows of plain-text buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
}

impl ReplyKeyboard {
    pub fn single(label: impl Into<String>) -> Self {
        Self {
            rows: vec![vec![label.into()]],
            resize: true,
        }
    }
}

/// Formatting hints for one outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<ReplyKeyboard>,
}

impl SendOptions {
    pub fn markdown() -> Self {
        Self {
            parse_mode: Some(ParseMode::Markdown),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A slash command advertised in the client's command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub command: String,
    pub description: String,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub chat_id: ChatId,
    pub text: String,
}

/// Trait for chat platform implementations.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one message to one chat.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), DeliveryError>;

    /// Publish the bot's command menu.
    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<(), DeliveryError>;

    /// Human-readable name for this channel (e.g., "telegram").
    fn channel_name(&self) -> &str;
}

/// Result of delivering a message to a single recipient.
#[derive(Debug)]
pub struct DeliveryResult {
    pub chat_id: ChatId,
    pub success: bool,
    pub blocked: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
