mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use svitlo_core::{ChatId, Classification, ScheduleRecord, Subscriber};
use svitlo_store::{MemorySubscriptionRegistry, ScheduleStore, StoreError, Stores};
use svitlo_watcher::{CycleError, CycleOutcome};
use tokio::sync::Notify;

use common::{harness, harness_with_stores, FakeSource};

const MORNING: &str = "🔴 08:30 - 09:30";
const EVENING: &str = "🔴 18:00 - 21:00";

async fn subscribe(h: &common::Harness, ids: &[i64]) {
    for &id in ids {
        h.stores
            .subscribers
            .add(Subscriber::new(ChatId(id), Utc::now()))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn cold_start_persists_without_notifying() {
    let h = harness(FakeSource::serving(Some(MORNING)));
    subscribe(&h, &[1, 2]).await;

    let outcome = h.poller.run_cycle().await.unwrap();
    assert_eq!(outcome.classification(), Some(Classification::Initialized));

    let record = h.stores.schedule.get().await.unwrap().unwrap();
    assert_eq!(record.content.as_str(), MORNING);
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn unchanged_refreshes_timestamp_only() {
    let h = harness(FakeSource::serving(Some(MORNING)));
    subscribe(&h, &[1]).await;

    let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2026, 10, 19, 6, 15, 0).unwrap();
    h.poller.run_cycle_at(t0).await.unwrap();
    let outcome = h.poller.run_cycle_at(t1).await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Unchanged));
    let record = h.stores.schedule.get().await.unwrap().unwrap();
    assert_eq!(record.last_updated, t1);
    assert_eq!(record.content.as_str(), MORNING);
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn change_notifies_each_subscriber_once() {
    let h = harness(FakeSource::serving(Some(MORNING)));
    subscribe(&h, &[1, 2, 3]).await;
    h.poller.run_cycle().await.unwrap();

    h.source.set(Some(EVENING));
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let outcome = h.poller.run_cycle_at(now).await.unwrap();

    let CycleOutcome::Changed { report } = outcome else {
        panic!("expected a change");
    };
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.delivered(), 3);

    for id in [1, 2, 3] {
        let texts = h.transport.sent_to(id);
        assert_eq!(texts.len(), 1, "chat {id}");
        assert_eq!(
            texts[0],
            "🔔 *Оновлення на 19.10.2026:*\n\nГрафік змінився:\n\n🔴 18:00 - 21:00"
        );
    }
    let record = h.stores.schedule.get().await.unwrap().unwrap();
    assert_eq!(record.content.as_str(), EVENING);
}

#[tokio::test]
async fn one_bad_recipient_does_not_affect_others() {
    let h = harness(FakeSource::serving(Some(MORNING)));
    subscribe(&h, &[1, 2, 3, 4]).await;
    h.poller.run_cycle().await.unwrap();

    h.transport.block(2);
    h.transport.make_flaky(3);
    h.source.set(Some(EVENING));
    let outcome = h.poller.run_cycle().await.unwrap();

    let CycleOutcome::Changed { report } = outcome else {
        panic!("expected a change");
    };
    assert_eq!(report.delivered(), 2);
    assert_eq!(report.blocked(), vec![ChatId(2)]);
    assert_eq!(report.transient_failures(), 1);
    assert_eq!(report.pruned, 1);

    assert_eq!(h.transport.sent_to(1).len(), 1);
    assert_eq!(h.transport.sent_to(4).len(), 1);
    let subs = &h.stores.subscribers;
    assert!(!subs.exists(ChatId(2)).await.unwrap());
    assert!(subs.exists(ChatId(3)).await.unwrap());
}

#[tokio::test]
async fn failed_fetch_leaves_record_untouched() {
    let h = harness(FakeSource::serving(Some(MORNING)));
    subscribe(&h, &[1]).await;
    h.poller.run_cycle().await.unwrap();
    let before = h.stores.schedule.get().await.unwrap();

    h.source.set(None);
    let outcome = h.poller.run_cycle().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::NoData { .. }));
    assert_eq!(h.stores.schedule.get().await.unwrap(), before);
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn failed_fetch_on_cold_start_stores_nothing() {
    let h = harness(FakeSource::serving(None));
    let outcome = h.poller.run_cycle().await.unwrap();
    assert!(outcome.classification().is_none());
    assert!(h.stores.schedule.get().await.unwrap().is_none());
}

#[tokio::test]
async fn overlapping_tick_is_skipped() {
    let gate = Arc::new(Notify::new());
    let h = harness(FakeSource::gated(MORNING, gate.clone()));

    let poller = h.poller.clone();
    let in_flight = tokio::spawn(async move { poller.run_cycle().await });

    // Wait until the first cycle is parked inside the fetch.
    while h.source.calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(h.poller.try_run_cycle().await.is_none());
    assert_eq!(h.source.calls(), 1);

    gate.notify_one();
    let outcome = in_flight.await.unwrap().unwrap();
    assert!(matches!(outcome, CycleOutcome::Initialized));
}

#[tokio::test]
async fn on_demand_read_cold_starts_without_broadcast() {
    let h = harness(FakeSource::serving(Some(MORNING)));
    subscribe(&h, &[1]).await;

    let record = h.poller.current_schedule().await.unwrap().unwrap();
    assert_eq!(record.content.as_str(), MORNING);
    assert!(h.transport.sent().is_empty());

    // Served from the store from now on.
    h.poller.current_schedule().await.unwrap();
    assert_eq!(h.source.calls(), 1);
}

/// Schedule store whose reads always fail; counts attempted writes.
#[derive(Default)]
struct UnreadableSchedule {
    puts: AtomicUsize,
}

#[async_trait]
impl ScheduleStore for UnreadableSchedule {
    async fn get(&self) -> svitlo_store::Result<Option<ScheduleRecord>> {
        Err(StoreError::NotConfigured("schedule table missing".to_string()))
    }

    async fn put(&self, _record: &ScheduleRecord) -> svitlo_store::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "unreadable"
    }
}

#[tokio::test]
async fn unreadable_store_aborts_cycle_without_writing_or_sending() {
    let schedule = Arc::new(UnreadableSchedule::default());
    let stores = Stores {
        schedule: schedule.clone(),
        subscribers: Arc::new(MemorySubscriptionRegistry::new()),
    };
    let h = harness_with_stores(FakeSource::serving(Some(EVENING)), stores);
    subscribe(&h, &[1, 2]).await;

    let result = h.poller.run_cycle().await;

    assert!(matches!(result, Err(CycleError::Persistence(_))));
    assert_eq!(schedule.puts.load(Ordering::SeqCst), 0);
    assert!(h.transport.sent().is_empty());
    assert_eq!(h.transport.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn on_demand_read_waiting_on_a_cycle_reuses_its_result() {
    let gate = Arc::new(Notify::new());
    let h = harness(FakeSource::gated(MORNING, gate.clone()));
    subscribe(&h, &[1]).await;

    let poller = h.poller.clone();
    let timer_cycle = tokio::spawn(async move { poller.run_cycle().await });
    while h.source.calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Misses the empty store, then queues behind the in-flight cycle.
    let poller = h.poller.clone();
    let reader = tokio::spawn(async move { poller.current_schedule().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    gate.notify_one();
    timer_cycle.await.unwrap().unwrap();
    let record = reader.await.unwrap().unwrap().unwrap();

    assert_eq!(record.content.as_str(), MORNING);
    assert_eq!(h.source.calls(), 1);
    assert!(h.transport.sent().is_empty());
}
