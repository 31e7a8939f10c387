use thiserror::Error;

/// Malformed slot data in a day's calendar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid slot label '{0}': expected HH:MM")]
    InvalidSlotLabel(String),

    #[error("invalid time of day {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}
