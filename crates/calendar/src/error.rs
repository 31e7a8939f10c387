use svitlo_core::ScheduleError;

/// Why a calendar fetch produced no schedule.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("calendar API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("calendar not configured: {0}")]
    Config(String),
}

impl From<ScheduleError> for FetchError {
    fn from(e: ScheduleError) -> Self {
        FetchError::Shape(e.to_string())
    }
}
