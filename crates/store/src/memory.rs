//! In-process backend for tests and throwaway runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use svitlo_core::{ChatId, ScheduleRecord, Subscriber};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::{ScheduleStore, SubscriptionRegistry};

#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    record: RwLock<Option<ScheduleRecord>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: ScheduleRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn get(&self) -> Result<Option<ScheduleRecord>> {
        Ok(self.record.read().await.clone())
    }

    async fn put(&self, record: &ScheduleRecord) -> Result<()> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[derive(Debug, Default)]
pub struct MemorySubscriptionRegistry {
    subscribers: RwLock<BTreeMap<ChatId, Subscriber>>,
}

impl MemorySubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRegistry for MemorySubscriptionRegistry {
    async fn list(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.read().await.values().cloned().collect())
    }

    async fn exists(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.subscribers.read().await.contains_key(&chat_id))
    }

    async fn add(&self, subscriber: Subscriber) -> Result<bool> {
        let mut subs = self.subscribers.write().await;
        if subs.contains_key(&subscriber.chat_id) {
            return Ok(false);
        }
        subs.insert(subscriber.chat_id, subscriber);
        Ok(true)
    }

    async fn remove(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.subscribers.write().await.remove(&chat_id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.subscribers.read().await.len())
    }
}
