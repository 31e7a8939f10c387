//! Time-of-day labels and the per-day slot status map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Width of one calendar slot, in minutes.
pub const SLOT_MINUTES: u16 = 30;

// ── TimeOfDay ─────────────────────────────────────────────────

/// A wall-clock time within one day, minute precision.
///
/// Parsed from and rendered as fixed-width `HH:MM`, so ordering by value is
/// the same as ordering the labels lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { minutes: 0 };

    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour >= 24 || minute >= 60 {
            return Err(ScheduleError::InvalidTime { hour, minute });
        }
        Ok(Self {
            minutes: (hour * 60 + minute) as u16,
        })
    }

    pub fn hour(self) -> u32 {
        u32::from(self.minutes / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.minutes % 60)
    }

    /// Minutes since midnight.
    pub fn minutes_since_midnight(self) -> u16 {
        self.minutes
    }

    /// Add minutes, wrapping past midnight back into `00:00..=23:59`.
    pub fn wrapping_add_minutes(self, minutes: u16) -> Self {
        let total = (u32::from(self.minutes) + u32::from(minutes)) % u32::from(MINUTES_PER_DAY);
        Self {
            minutes: total as u16,
        }
    }

    /// End of the slot that starts at `self`.
    pub fn slot_end(self) -> Self {
        self.wrapping_add_minutes(SLOT_MINUTES)
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidSlotLabel(label.to_string());
        let bytes = label.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let hour = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
        let minute = u32::from(digits[2] - b'0') * 10 + u32::from(digits[3] - b'0');
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

// ── SlotStatus ────────────────────────────────────────────────

/// Power status of a single slot as published by the utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    On,
    /// Code `"1"`: outage confirmed.
    Off,
    /// Code `"10"`: outage possible.
    PossiblyOff,
}

impl SlotStatus {
    /// Exact match only: `" 1"` is not `"1"`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => SlotStatus::Off,
            "10" => SlotStatus::PossiblyOff,
            _ => SlotStatus::On,
        }
    }

    /// Confirmed and possible outages are reported identically.
    pub fn is_off_like(self) -> bool {
        matches!(self, SlotStatus::Off | SlotStatus::PossiblyOff)
    }
}

// ── TimeSlotStatus ────────────────────────────────────────────

/// One day's slot map, keyed and iterated in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotStatus {
    slots: BTreeMap<TimeOfDay, SlotStatus>,
}

impl TimeSlotStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(label, status code)` pairs.
    ///
    /// Fails on the first label that is not a fixed-width `HH:MM`.
    pub fn from_codes<I, K, V>(codes: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut slots = BTreeMap::new();
        for (label, code) in codes {
            let time: TimeOfDay = label.as_ref().parse()?;
            slots.insert(time, SlotStatus::from_code(code.as_ref()));
        }
        Ok(Self { slots })
    }

    pub fn insert(&mut self, time: TimeOfDay, status: SlotStatus) {
        self.slots.insert(time, status);
    }

    pub fn get(&self, time: TimeOfDay) -> Option<SlotStatus> {
        self.slots.get(&time).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimeOfDay, SlotStatus)> + '_ {
        self.slots.iter().map(|(t, s)| (*t, *s))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
