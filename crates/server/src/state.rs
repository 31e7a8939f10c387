use std::sync::Arc;

use svitlo_store::ScheduleStore;

/// Shared state behind the liveness routes.
pub struct AppState {
    pub schedule: Arc<dyn ScheduleStore>,
}

impl AppState {
    pub fn new(schedule: Arc<dyn ScheduleStore>) -> Self {
        Self { schedule }
    }
}
