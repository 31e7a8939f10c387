//! Merging a day's slots into outage intervals and rendering them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::slots::{TimeOfDay, TimeSlotStatus};
use crate::error::ScheduleError;

/// Prefix of every interval line in a rendered schedule.
pub const OUTAGE_MARKER: &str = "🔴";

/// Rendering of a day with no off-like slots.
pub const ALL_CLEAR: &str = "✅ Світло увімкнено весь день (графік порожній).";

/// A half-open outage window `[start, end)`.
///
/// `end` may be numerically before `start` when the last off slot runs up to
/// midnight; it is rendered as `00:00` rather than carried into the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl fmt::Display for OutageInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OUTAGE_MARKER} {} - {}", self.start, self.end)
    }
}

/// Canonical text form of a day's outages; the sole change-detection key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedSchedule(String);

impl RenderedSchedule {
    pub fn all_clear() -> Self {
        Self(ALL_CLEAR.to_string())
    }

    /// Wrap text that was previously rendered (e.g. loaded from a store).
    pub fn from_stored(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_all_clear(&self) -> bool {
        self.0 == ALL_CLEAR
    }
}

impl fmt::Display for RenderedSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RenderedSchedule {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Turns a [`TimeSlotStatus`] into merged [`OutageInterval`]s.
pub struct IntervalParser;

impl IntervalParser {
    /// Single ordered scan; consecutive off-like slots collapse into one run.
    pub fn intervals(slots: &TimeSlotStatus) -> Vec<OutageInterval> {
        let mut out = Vec::new();
        // (run start, start of the last off slot seen in the run)
        let mut open: Option<(TimeOfDay, TimeOfDay)> = None;

        for (time, status) in slots.iter() {
            match (status.is_off_like(), open) {
                (true, None) => open = Some((time, time)),
                (true, Some((start, _))) => open = Some((start, time)),
                (false, Some((start, last_off))) => {
                    out.push(OutageInterval {
                        start,
                        end: last_off.slot_end(),
                    });
                    open = None;
                }
                (false, None) => {}
            }
        }

        if let Some((start, last_off)) = open {
            out.push(OutageInterval {
                start,
                end: last_off.slot_end(),
            });
        }

        out
    }

    pub fn render(slots: &TimeSlotStatus) -> RenderedSchedule {
        Self::render_intervals(&Self::intervals(slots))
    }

    pub fn render_intervals(intervals: &[OutageInterval]) -> RenderedSchedule {
        if intervals.is_empty() {
            return RenderedSchedule::all_clear();
        }
        let lines: Vec<String> = intervals.iter().map(ToString::to_string).collect();
        RenderedSchedule(lines.join("\n"))
    }

    /// Parse raw `(label, code)` pairs and render them in one step.
    pub fn render_codes<I, K, V>(codes: I) -> Result<RenderedSchedule, ScheduleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let slots = TimeSlotStatus::from_codes(codes)?;
        Ok(Self::render(&slots))
    }
}
