//! Fans one message out to every subscriber.
//!
//! Each recipient gets exactly one attempt, bounded by a per-call timeout.
//! A failure for one recipient never stops delivery to the others. Recipients
//! whose delivery failed as blocked are pruned from the registry afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use svitlo_core::config::TelegramConfig;
use svitlo_core::ChatId;
use svitlo_store::{StoreError, SubscriptionRegistry};

use crate::traits::{ChatTransport, DeliveryError, DeliveryResult, SendOptions};

/// Outcome of one broadcast.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub results: Vec<DeliveryResult>,
    /// Blocked recipients actually removed from the registry.
    pub pruned: usize,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Failed without being blocked; these recipients are kept.
    pub fn transient_failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success && !r.blocked).count()
    }

    pub fn blocked(&self) -> Vec<ChatId> {
        self.results
            .iter()
            .filter(|r| r.blocked)
            .map(|r| r.chat_id)
            .collect()
    }
}

pub struct Broadcaster {
    transport: Arc<dyn ChatTransport>,
    concurrency: usize,
    per_call_timeout: Duration,
}

impl Broadcaster {
    pub fn new(transport: Arc<dyn ChatTransport>, concurrency: usize, per_call_timeout: Duration) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
            per_call_timeout,
        }
    }

    pub fn from_config(transport: Arc<dyn ChatTransport>, config: &TelegramConfig) -> Self {
        Self::new(
            transport,
            config.broadcast_concurrency,
            Duration::from_secs(config.send_timeout_secs),
        )
    }

    /// Single attempt to one recipient, bounded by the per-call timeout.
    pub async fn deliver(&self, chat_id: ChatId, text: &str, options: &SendOptions) -> DeliveryResult {
        let start = Instant::now();
        let result = match tokio::time::timeout(
            self.per_call_timeout,
            self.transport.send_message(chat_id, text, options),
        )
        .await
        {
            Ok(inner) => inner,
            Err(_) => Err(DeliveryError::Timeout(self.per_call_timeout.as_secs())),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                tracing::debug!(%chat_id, duration_ms, "Message delivered");
                DeliveryResult {
                    chat_id,
                    success: true,
                    blocked: false,
                    error: None,
                    duration_ms,
                }
            }
            Err(e) => {
                let blocked = e.is_blocked();
                tracing::warn!(
                    %chat_id,
                    channel = self.transport.channel_name(),
                    error = %e,
                    blocked,
                    duration_ms,
                    "Message delivery failed"
                );
                DeliveryResult {
                    chat_id,
                    success: false,
                    blocked,
                    error: Some(e.to_string()),
                    duration_ms,
                }
            }
        }
    }

    /// Deliver to each recipient once; order across recipients is unspecified.
    pub async fn broadcast(&self, text: &str, options: &SendOptions, recipients: &[ChatId]) -> BroadcastReport {
        let results: Vec<DeliveryResult> = stream::iter(recipients.iter().copied())
            .map(|chat_id| self.deliver(chat_id, text, options))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let report = BroadcastReport { results, pruned: 0 };
        tracing::info!(
            attempted = report.attempted(),
            delivered = report.delivered(),
            blocked = report.blocked().len(),
            transient = report.transient_failures(),
            "Broadcast finished"
        );
        report
    }

    /// Broadcast to everyone in `registry`, then remove blocked recipients.
    ///
    /// Only listing the registry can fail the call. A failed removal is
    /// logged and left for the next broadcast to retry.
    pub async fn broadcast_and_prune(
        &self,
        text: &str,
        options: &SendOptions,
        registry: &dyn SubscriptionRegistry,
    ) -> Result<BroadcastReport, StoreError> {
        let recipients: Vec<ChatId> = registry.list().await?.into_iter().map(|s| s.chat_id).collect();
        let mut report = self.broadcast(text, options, &recipients).await;
        report.pruned = prune_blocked(registry, &report.blocked()).await;
        Ok(report)
    }
}

/// Remove each blocked id; returns how many were actually removed.
pub async fn prune_blocked(registry: &dyn SubscriptionRegistry, blocked: &[ChatId]) -> usize {
    let mut pruned = 0;
    for &chat_id in blocked {
        match registry.remove(chat_id).await {
            Ok(true) => {
                pruned += 1;
                tracing::info!(%chat_id, "Unsubscribed blocked recipient");
            }
            Ok(false) => tracing::debug!(%chat_id, "Blocked recipient already gone"),
            Err(e) => tracing::warn!(%chat_id, error = %e, "Failed to unsubscribe blocked recipient"),
        }
    }
    pruned
}
