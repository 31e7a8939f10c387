//! Timer loop driving the poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::poller::Poller;

/// Poll forever. The first tick fires immediately.
///
/// A tick that finds a cycle still running is skipped; a failed cycle is
/// logged and the loop carries on.
pub async fn run_poll_loop(poller: Arc<Poller>, every: Duration) {
    info!("Schedule poller active, checking every {}s", every.as_secs());

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match poller.try_run_cycle().await {
            None => debug!("Previous cycle still running, skipping tick"),
            Some(Ok(outcome)) => debug!(outcome = %outcome, "Poll tick done"),
            Some(Err(e)) => warn!(error = %e, "Poll cycle failed"),
        }
    }
}
