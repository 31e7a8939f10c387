//! Liveness endpoints for uptime pingers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use svitlo_store::ScheduleStore;
use tracing::warn;

use crate::state::AppState;

pub const BANNER: &str = "🤖 Bot is running...";

pub async fn root() -> &'static str {
    BANNER
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Always `ok` while the process serves requests; `last_updated` is best effort.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let last_updated = match state.schedule.get().await {
        Ok(record) => record.map(|r| r.last_updated),
        Err(e) => {
            warn!(error = %e, "Health check could not read schedule record");
            None
        }
    };
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        last_updated,
    })
}
