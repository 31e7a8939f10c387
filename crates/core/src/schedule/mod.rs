//! Slot statuses, outage intervals and their canonical rendering.

pub mod interval;
pub mod slots;

pub use interval::{IntervalParser, OutageInterval, RenderedSchedule, ALL_CLEAR, OUTAGE_MARKER};
pub use slots::{SlotStatus, TimeOfDay, TimeSlotStatus, SLOT_MINUTES};
