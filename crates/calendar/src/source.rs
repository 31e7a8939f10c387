use async_trait::async_trait;
use svitlo_core::RenderedSchedule;

use crate::error::FetchError;

/// Anything that can produce today's rendered schedule.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_schedule(&self) -> Result<RenderedSchedule, FetchError>;

    /// Human-readable name for logs.
    fn source_name(&self) -> &str;
}
