#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use svitlo_calendar::{FetchError, ScheduleSource};
use svitlo_core::{ChatId, RenderedSchedule};
use svitlo_notify::{
    Broadcaster, ChatTransport, CommandSpec, DeliveryError, MessageRenderer, SendOptions,
};
use svitlo_store::Stores;
use svitlo_watcher::Poller;
use tokio::sync::Notify;

/// Serves whatever schedule is currently set; `None` simulates a failed fetch.
pub struct FakeSource {
    current: Mutex<Option<RenderedSchedule>>,
    pub calls: AtomicUsize,
    /// When set, each fetch waits for a permit before answering.
    gate: Option<Arc<Notify>>,
}

impl FakeSource {
    pub fn serving(schedule: Option<&str>) -> Self {
        Self {
            current: Mutex::new(schedule.map(RenderedSchedule::from_stored)),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(schedule: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::serving(Some(schedule))
        }
    }

    pub fn set(&self, schedule: Option<&str>) {
        *self.current.lock().unwrap() = schedule.map(RenderedSchedule::from_stored);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleSource for FakeSource {
    async fn fetch_schedule(&self) -> Result<RenderedSchedule, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
    }

    fn source_name(&self) -> &str {
        "fake"
    }
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub options: SendOptions,
}

/// Records every message; ids in `blocked` fail as blocked, in `flaky` as
/// transient, in `fail_once` as transient for the next message only.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    pub blocked: Mutex<HashSet<i64>>,
    pub flaky: Mutex<HashSet<i64>>,
    pub fail_once: Mutex<HashSet<i64>>,
    pub attempts: AtomicUsize,
}

impl RecordingTransport {
    pub fn block(&self, id: i64) {
        self.blocked.lock().unwrap().insert(id);
    }

    pub fn make_flaky(&self, id: i64) {
        self.flaky.lock().unwrap().insert(id);
    }

    pub fn fail_next(&self, id: i64) {
        self.fail_once.lock().unwrap().insert(id);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat_id == ChatId(id))
            .map(|s| s.text)
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.blocked.lock().unwrap().contains(&chat_id.0) {
            return Err(DeliveryError::Blocked("Forbidden: bot was blocked by the user".into()));
        }
        if self.fail_once.lock().unwrap().remove(&chat_id.0) {
            return Err(DeliveryError::Timeout(10));
        }
        if self.flaky.lock().unwrap().contains(&chat_id.0) {
            return Err(DeliveryError::RateLimited { retry_after_secs: 5 });
        }
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(())
    }

    async fn register_commands(&self, _commands: &[CommandSpec]) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub transport: Arc<RecordingTransport>,
    pub stores: Stores,
    pub renderer: Arc<MessageRenderer>,
    pub poller: Arc<Poller>,
}

pub fn kyiv() -> Tz {
    "Europe/Kyiv".parse().unwrap()
}

pub fn harness(source: FakeSource) -> Harness {
    harness_with_stores(source, Stores::in_memory())
}

pub fn harness_with_stores(source: FakeSource, stores: Stores) -> Harness {
    let source = Arc::new(source);
    let transport = Arc::new(RecordingTransport::default());
    let renderer = Arc::new(MessageRenderer::new().unwrap());
    let broadcaster = Arc::new(Broadcaster::new(transport.clone(), 4, Duration::from_secs(5)));
    let poller = Arc::new(Poller::new(
        source.clone(),
        stores.clone(),
        broadcaster,
        renderer.clone(),
        kyiv(),
    ));
    Harness {
        source,
        transport,
        stores,
        renderer,
        poller,
    }
}
