pub mod change;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod schedule;

pub use change::{ChangeDetector, Classification, Detection};
pub use config::Config;
pub use entity::*;
pub use error::*;
pub use schedule::{IntervalParser, OutageInterval, RenderedSchedule, SlotStatus, TimeOfDay, TimeSlotStatus};
