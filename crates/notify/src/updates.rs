//! Background long-poll loop turning Telegram updates into [`InboundCommand`]s.

use std::sync::Arc;
use std::time::Duration;

use svitlo_core::ChatId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::telegram::{TelegramTransport, Update};
use crate::traits::InboundCommand;

const INITIAL_BACKOFF_SECS: u64 = 5;
const MAX_BACKOFF_SECS: u64 = 60;

/// Text messages only; everything else is skipped.
pub fn to_command(update: &Update) -> Option<InboundCommand> {
    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(InboundCommand {
        chat_id: ChatId(message.chat.id),
        text: text.to_string(),
    })
}

fn next_backoff(current: u64) -> u64 {
    (current * 2).min(MAX_BACKOFF_SECS)
}

/// Start polling `getUpdates`; commands arrive on the returned receiver.
///
/// The task exits once the receiver is dropped. Errors back off 5s, doubling
/// up to 60s, and reset after the next successful poll.
pub fn spawn_update_listener(
    transport: Arc<TelegramTransport>,
    timeout_secs: u64,
) -> (mpsc::Receiver<InboundCommand>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);

    let handle = tokio::spawn(async move {
        let mut offset: Option<i64> = None;
        let mut backoff_secs = INITIAL_BACKOFF_SECS;

        tracing::info!("Telegram update listener started");
        loop {
            let updates = match transport.get_updates(offset, timeout_secs).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::error!(error = %e, "getUpdates failed, retrying in {backoff_secs}s");
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs = next_backoff(backoff_secs);
                    continue;
                }
            };
            backoff_secs = INITIAL_BACKOFF_SECS;

            for update in &updates {
                offset = Some(update.update_id + 1);
                let Some(command) = to_command(update) else {
                    continue;
                };
                tracing::debug!(chat_id = %command.chat_id, text = %command.text, "Inbound message");
                if tx.send(command).await.is_err() {
                    tracing::info!("Command receiver dropped, stopping update listener");
                    return;
                }
            }
        }
    });

    (rx, handle)
}
