//! The poll cycle: fetch, render, compare, persist, broadcast.
//!
//! Cycles never overlap. `run_cycle` waits for an in-flight cycle to finish;
//! `try_run_cycle` skips instead, which is what the timer uses.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use svitlo_calendar::ScheduleSource;
use svitlo_core::clock::date_stamp;
use svitlo_core::{ChangeDetector, Classification, ScheduleRecord};
use svitlo_notify::{BroadcastReport, Broadcaster, MessageRenderer, SendOptions};
use svitlo_store::{ScheduleStore, Stores, SubscriptionRegistry};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CycleError;

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Fetch or decode failed; nothing was read, written or sent.
    NoData { reason: String },
    Initialized,
    Unchanged,
    Changed { report: BroadcastReport },
}

impl CycleOutcome {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            CycleOutcome::NoData { .. } => None,
            CycleOutcome::Initialized => Some(Classification::Initialized),
            CycleOutcome::Unchanged => Some(Classification::Unchanged),
            CycleOutcome::Changed { .. } => Some(Classification::Changed),
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoData { reason } => write!(f, "no data ({reason})"),
            CycleOutcome::Initialized => write!(f, "initialized"),
            CycleOutcome::Unchanged => write!(f, "unchanged"),
            CycleOutcome::Changed { report } => write!(
                f,
                "changed: {}/{} delivered, {} pruned",
                report.delivered(),
                report.attempted(),
                report.pruned
            ),
        }
    }
}

pub struct Poller {
    source: Arc<dyn ScheduleSource>,
    schedule: Arc<dyn ScheduleStore>,
    subscribers: Arc<dyn SubscriptionRegistry>,
    broadcaster: Arc<Broadcaster>,
    renderer: Arc<MessageRenderer>,
    tz: Tz,
    cycle_guard: Mutex<()>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn ScheduleSource>,
        stores: Stores,
        broadcaster: Arc<Broadcaster>,
        renderer: Arc<MessageRenderer>,
        tz: Tz,
    ) -> Self {
        Self {
            source,
            schedule: stores.schedule,
            subscribers: stores.subscribers,
            broadcaster,
            renderer,
            tz,
            cycle_guard: Mutex::new(()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn subscribers(&self) -> &Arc<dyn SubscriptionRegistry> {
        &self.subscribers
    }

    /// Run one cycle now, waiting for any in-flight cycle first.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        self.run_cycle_at(Utc::now()).await
    }

    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleOutcome, CycleError> {
        let _guard = self.cycle_guard.lock().await;
        self.cycle(now).await
    }

    /// Run one cycle unless another is in flight, in which case `None`.
    pub async fn try_run_cycle(&self) -> Option<Result<CycleOutcome, CycleError>> {
        let _guard = self.cycle_guard.try_lock().ok()?;
        Some(self.cycle(Utc::now()).await)
    }

    async fn cycle(&self, now: DateTime<Utc>) -> Result<CycleOutcome, CycleError> {
        let current = match self.source.fetch_schedule().await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(source = self.source.source_name(), error = %e, "Schedule fetch failed, skipping cycle");
                return Ok(CycleOutcome::NoData {
                    reason: e.to_string(),
                });
            }
        };

        let previous = self.schedule.get().await?;
        let detection = ChangeDetector::detect(current, previous.as_ref(), now);

        // Stored before any message goes out.
        self.schedule.put(&detection.record).await?;

        let outcome = match detection.classification {
            Classification::Initialized => {
                info!("Initial schedule saved");
                CycleOutcome::Initialized
            }
            Classification::Unchanged => CycleOutcome::Unchanged,
            Classification::Changed => {
                info!("Schedule changed, broadcasting");
                let report = self.announce(&detection.record, now).await?;
                CycleOutcome::Changed { report }
            }
        };

        info!(outcome = %outcome, "Cycle finished");
        Ok(outcome)
    }

    async fn announce(&self, record: &ScheduleRecord, now: DateTime<Utc>) -> Result<BroadcastReport, CycleError> {
        let text = self
            .renderer
            .change_notice(&date_stamp(self.tz, now), &record.content)?;
        let report = self
            .broadcaster
            .broadcast_and_prune(&text, &SendOptions::markdown(), self.subscribers.as_ref())
            .await?;
        Ok(report)
    }

    /// The stored record, or one fresh guarded cycle's result on a miss.
    ///
    /// Used by on-demand reads. Never broadcasts: the store is checked again
    /// under the cycle lock, so the cycle only runs while nothing is stored
    /// and can only initialize.
    pub async fn current_schedule(&self) -> Result<Option<ScheduleRecord>, CycleError> {
        if let Some(record) = self.schedule.get().await? {
            return Ok(Some(record));
        }

        let _guard = self.cycle_guard.lock().await;
        if let Some(record) = self.schedule.get().await? {
            debug!("Schedule stored by the cycle we waited on");
            return Ok(Some(record));
        }
        info!("Schedule cache miss, running a cycle");
        let outcome = self.cycle(Utc::now()).await?;
        if let CycleOutcome::NoData { reason } = &outcome {
            warn!(%reason, "No schedule available on demand");
        }
        Ok(self.schedule.get().await?)
    }
}
