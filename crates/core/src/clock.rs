//! Local-day arithmetic for the configured timezone.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ScheduleError;

pub const DEFAULT_TIMEZONE: &str = "Europe/Kyiv";

pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
}

/// UTC bounds of the local calendar day containing `now`.
///
/// Returns `(first instant, last millisecond)`, both inclusive.
pub fn day_bounds_utc(tz: Tz, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(&tz).date_naive();
    let start = local_day_start(tz, today);
    let end = match today.checked_add_days(Days::new(1)) {
        Some(tomorrow) => local_day_start(tz, tomorrow),
        None => start + Duration::days(1),
    } - Duration::milliseconds(1);
    (start, end)
}

/// First existing instant of `date` in `tz`; midnight can be skipped by a DST jump.
fn local_day_start(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    for hour in 0..3 {
        let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
            continue;
        };
        if let Some(local) = tz.from_local_datetime(&date.and_time(time)).earliest() {
            return local.with_timezone(&Utc);
        }
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2026-10-18T21:00:00.000Z`.
pub fn iso_millis(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// `dd.mm.yyyy` as seen in `tz`.
pub fn date_stamp(tz: Tz, at: DateTime<Utc>) -> String {
    at.with_timezone(&tz).format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kyiv() -> Tz {
        parse_timezone(DEFAULT_TIMEZONE).unwrap()
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert_eq!(
            parse_timezone("Mars/Olympus").unwrap_err(),
            ScheduleError::UnknownTimezone("Mars/Olympus".to_string())
        );
    }

    #[test]
    fn summer_day_is_utc_plus_three() {
        let now = Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap();
        let (after, before) = day_bounds_utc(kyiv(), now);
        assert_eq!(iso_millis(after), "2026-07-14T21:00:00.000Z");
        assert_eq!(iso_millis(before), "2026-07-15T20:59:59.999Z");
    }

    #[test]
    fn winter_day_is_utc_plus_two() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        let (after, before) = day_bounds_utc(kyiv(), now);
        assert_eq!(iso_millis(after), "2026-01-09T22:00:00.000Z");
        assert_eq!(iso_millis(before), "2026-01-10T21:59:59.999Z");
    }

    #[test]
    fn late_utc_evening_is_already_tomorrow_in_kyiv() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 22, 30, 0).unwrap();
        assert_eq!(date_stamp(kyiv(), now), "19.10.2026");
        let (after, _) = day_bounds_utc(kyiv(), now);
        assert_eq!(iso_millis(after), "2026-10-18T21:00:00.000Z");
    }

    #[test]
    fn dst_change_day_is_23_hours() {
        // Clocks go forward on the last Sunday of March.
        let now = Utc.with_ymd_and_hms(2026, 3, 29, 12, 0, 0).unwrap();
        let (after, before) = day_bounds_utc(kyiv(), now);
        assert_eq!(iso_millis(after), "2026-03-28T22:00:00.000Z");
        assert_eq!(iso_millis(before), "2026-03-29T20:59:59.999Z");
    }
}
