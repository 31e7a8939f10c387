//! JSON files under a data directory, rewritten atomically.
//!
//! `schedule.json` holds one [`ScheduleRecord`]; `subscribers.json` holds an
//! array of [`Subscriber`]. A missing file reads as empty.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use svitlo_core::{ChatId, ScheduleRecord, Subscriber};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::traits::{ScheduleStore, SubscriptionRegistry};

const SCHEDULE_FILE: &str = "schedule.json";
const SUBSCRIBERS_FILE: &str = "subscribers.json";

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a dot-prefixed `.tmp` sibling, then rename over the target.
async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    debug!(path = %path.display(), "wrote json file");
    Ok(())
}

// ── Schedule ──────────────────────────────────────────────────

#[derive(Debug)]
pub struct JsonScheduleStore {
    path: PathBuf,
}

impl JsonScheduleStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SCHEDULE_FILE),
        }
    }
}

#[async_trait]
impl ScheduleStore for JsonScheduleStore {
    async fn get(&self) -> Result<Option<ScheduleRecord>> {
        read_json(&self.path).await
    }

    async fn put(&self, record: &ScheduleRecord) -> Result<()> {
        write_json_atomic(&self.path, record).await
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

// ── Subscribers ───────────────────────────────────────────────

/// Read-modify-write on `subscribers.json`, serialized by an async mutex.
#[derive(Debug)]
pub struct JsonSubscriptionRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSubscriptionRegistry {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SUBSCRIBERS_FILE),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Subscriber>> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl SubscriptionRegistry for JsonSubscriptionRegistry {
    async fn list(&self) -> Result<Vec<Subscriber>> {
        self.load().await
    }

    async fn exists(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.load().await?.iter().any(|s| s.chat_id == chat_id))
    }

    async fn add(&self, subscriber: Subscriber) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut subs = self.load().await?;
        if subs.iter().any(|s| s.chat_id == subscriber.chat_id) {
            return Ok(false);
        }
        info!(chat_id = %subscriber.chat_id, "subscriber added");
        subs.push(subscriber);
        write_json_atomic(&self.path, &subs).await?;
        Ok(true)
    }

    async fn remove(&self, chat_id: ChatId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut subs = self.load().await?;
        let before = subs.len();
        subs.retain(|s| s.chat_id != chat_id);
        if subs.len() == before {
            return Ok(false);
        }
        write_json_atomic(&self.path, &subs).await?;
        info!(chat_id = %chat_id, "subscriber removed");
        Ok(true)
    }
}
