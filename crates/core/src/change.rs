//! Comparing a freshly rendered schedule to the last persisted one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::ScheduleRecord;
use crate::schedule::RenderedSchedule;

/// Outcome of comparing the current schedule to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Nothing was stored yet; persist without notifying.
    Initialized,
    /// Same content; refresh the timestamp only.
    Unchanged,
    /// Content differs; persist and notify subscribers.
    Changed,
}

impl Classification {
    pub fn should_notify(self) -> bool {
        matches!(self, Classification::Changed)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Initialized => write!(f, "initialized"),
            Classification::Unchanged => write!(f, "unchanged"),
            Classification::Changed => write!(f, "changed"),
        }
    }
}

/// Result of a detection: the classification plus the record to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub classification: Classification,
    pub record: ScheduleRecord,
}

impl Detection {
    pub fn should_notify(&self) -> bool {
        self.classification.should_notify()
    }
}

/// Exact string comparison on [`RenderedSchedule`].
///
/// Only ever called with a schedule that was actually fetched; a failed fetch
/// has no `current` and must skip detection entirely.
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn classify(current: &RenderedSchedule, previous: Option<&ScheduleRecord>) -> Classification {
        match previous {
            None => Classification::Initialized,
            Some(record) if record.content == *current => Classification::Unchanged,
            Some(_) => Classification::Changed,
        }
    }

    /// Classify and build the replacement record stamped with `now`.
    ///
    /// Every classification yields a record to persist, so an unchanged
    /// schedule still refreshes `last_updated`.
    pub fn detect(
        current: RenderedSchedule,
        previous: Option<&ScheduleRecord>,
        now: DateTime<Utc>,
    ) -> Detection {
        let classification = Self::classify(&current, previous);
        Detection {
            classification,
            record: ScheduleRecord::new(current, now),
        }
    }
}
