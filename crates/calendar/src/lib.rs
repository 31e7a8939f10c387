//! Remote outage calendar: request construction and fail-closed decoding.

pub mod client;
pub mod decode;
pub mod error;
pub mod source;

pub use client::CalendarClient;
pub use error::FetchError;
pub use source::ScheduleSource;
