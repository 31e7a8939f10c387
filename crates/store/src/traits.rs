//! Storage seams used by the poll cycle and the bot handlers.

use async_trait::async_trait;
use svitlo_core::{ChatId, ScheduleRecord, Subscriber};

use crate::error::Result;

/// Holds the single last-known [`ScheduleRecord`].
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get(&self) -> Result<Option<ScheduleRecord>>;

    /// Replace the stored record wholesale.
    async fn put(&self, record: &ScheduleRecord) -> Result<()>;

    fn backend_name(&self) -> &str;
}

/// Set of subscribers, unique on [`ChatId`].
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<Subscriber>>;

    async fn exists(&self, chat_id: ChatId) -> Result<bool>;

    /// Insert if absent. Returns `true` when a new subscriber was added.
    async fn add(&self, subscriber: Subscriber) -> Result<bool>;

    /// Idempotent delete. Returns `true` when something was removed.
    async fn remove(&self, chat_id: ChatId) -> Result<bool>;

    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}
