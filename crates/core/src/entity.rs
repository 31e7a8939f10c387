use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::RenderedSchedule;

/// Telegram chat identity of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId(id)
    }
}

/// The last known schedule, replaced wholesale on every successful cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub content: RenderedSchedule,
    pub last_updated: DateTime<Utc>,
}

impl ScheduleRecord {
    pub fn new(content: RenderedSchedule, last_updated: DateTime<Utc>) -> Self {
        Self {
            content,
            last_updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub chat_id: ChatId,
    pub joined_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(chat_id: ChatId, joined_at: DateTime<Utc>) -> Self {
        Self { chat_id, joined_at }
    }
}
