//! Inbound bot commands and their handling.

use std::sync::Arc;

use chrono::Utc;
use svitlo_core::clock::date_stamp;
use svitlo_core::{ChatId, Subscriber};
use svitlo_notify::{
    ChatTransport, CommandSpec, DeliveryError, InboundCommand, MessageRenderer, ReplyKeyboard,
    SendOptions, CHECK_BUTTON_LABEL,
};
use svitlo_store::SubscriptionRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::HandlerError;
use crate::poller::Poller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Subscribe (if needed) and show the schedule.
    Start,
    /// Show the schedule.
    Check,
}

impl BotCommand {
    /// Recognizes `/start`, `/check` (with optional `@BotName` suffix and
    /// payload) and the keyboard refresh button.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == CHECK_BUTTON_LABEL {
            return Some(BotCommand::Check);
        }
        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(BotCommand::Start),
            "check" => Some(BotCommand::Check),
            _ => None,
        }
    }

    /// Entries for the client's command menu.
    pub fn menu() -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("start", "Підписатися та показати графік"),
            CommandSpec::new("check", "Перевірити графік"),
        ]
    }
}

/// Markdown with the persistent refresh button.
pub fn reply_options() -> SendOptions {
    SendOptions::markdown().with_keyboard(ReplyKeyboard::single(CHECK_BUTTON_LABEL))
}

pub struct CommandHandler {
    poller: Arc<Poller>,
    transport: Arc<dyn ChatTransport>,
    renderer: Arc<MessageRenderer>,
}

impl CommandHandler {
    pub fn new(poller: Arc<Poller>, transport: Arc<dyn ChatTransport>, renderer: Arc<MessageRenderer>) -> Self {
        Self {
            poller,
            transport,
            renderer,
        }
    }

    fn registry(&self) -> &dyn SubscriptionRegistry {
        self.poller.subscribers().as_ref()
    }

    pub async fn handle(&self, inbound: &InboundCommand) -> Result<(), HandlerError> {
        let Some(command) = BotCommand::parse(&inbound.text) else {
            debug!(chat_id = %inbound.chat_id, "Ignoring non-command message");
            return Ok(());
        };
        info!(chat_id = %inbound.chat_id, ?command, "Handling command");

        let result = match command {
            BotCommand::Start => self.start(inbound.chat_id).await,
            BotCommand::Check => self.send_schedule(inbound.chat_id).await,
        };

        if let Err(HandlerError::Delivery(ref e)) = result {
            if e.is_blocked() {
                self.registry().remove(inbound.chat_id).await?;
                info!(chat_id = %inbound.chat_id, "Unsubscribed blocked recipient");
            }
        }
        result
    }

    async fn start(&self, chat_id: ChatId) -> Result<(), HandlerError> {
        let added = self.registry().add(Subscriber::new(chat_id, Utc::now())).await?;
        let text = if added {
            info!(%chat_id, "New subscriber");
            self.renderer.greeting()?
        } else {
            self.renderer.already_subscribed()?
        };
        match self
            .transport
            .send_message(chat_id, &text, &SendOptions::default())
            .await
        {
            Err(e) if e.is_blocked() => return Err(e.into()),
            Err(e) => warn!(%chat_id, error = %e, "Greeting not delivered, sending schedule anyway"),
            Ok(()) => {}
        }
        self.send_schedule(chat_id).await
    }

    /// Reply with the current schedule, or an apology when none is available.
    pub async fn send_schedule(&self, chat_id: ChatId) -> Result<(), HandlerError> {
        let record = match self.poller.current_schedule().await {
            Ok(record) => record,
            Err(e) => {
                warn!(%chat_id, error = %e, "Could not load schedule for reply");
                None
            }
        };

        let text = match record {
            Some(record) => {
                let date = date_stamp(self.poller.timezone(), Utc::now());
                self.renderer.schedule_reply(&date, &record.content)?
            }
            None => self.renderer.unavailable()?,
        };

        self.transport
            .send_message(chat_id, &text, &reply_options())
            .await
            .map_err(HandlerError::from)
    }

    pub async fn register_menu(&self) -> Result<(), DeliveryError> {
        self.transport.register_commands(&BotCommand::menu()).await
    }
}

/// Handle inbound commands one at a time until the sender side closes.
pub async fn run_command_loop(handler: Arc<CommandHandler>, mut rx: mpsc::Receiver<InboundCommand>) {
    while let Some(inbound) = rx.recv().await {
        if let Err(e) = handler.handle(&inbound).await {
            warn!(chat_id = %inbound.chat_id, error = %e, "Command handling failed");
        }
    }
    info!("Command channel closed");
}
