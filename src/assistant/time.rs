//! Anchoring of naive local times to the reference timezone.
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use super::provider::TimeWindow;

/// Interpret a wall clock time in `tz`. Times skipped by a DST jump are
/// read as UTC and converted.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<FixedOffset> {
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        .fixed_offset()
}

/// From 00:00:00 of `start` to 23:59:59 of `end` in `tz`.
pub fn day_window(start: NaiveDate, end: NaiveDate, tz: Tz) -> TimeWindow {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    TimeWindow {
        start: localize(start.and_time(NaiveTime::MIN), tz),
        end: localize(end.and_time(last_second), tz),
    }
}

/// Default search window: now until one month from now.
pub fn upcoming_window(now: DateTime<Tz>) -> TimeWindow {
    let now = now.fixed_offset();
    TimeWindow {
        start: now,
        end: now + Duration::days(30),
    }
}

/// A due date as written to the provider: midnight in `tz` with its
/// offset, e.g. `2025-11-25T00:00:00-03:00`.
pub fn anchor_due_date(date: NaiveDate, tz: Tz) -> String {
    localize(date.and_time(NaiveTime::MIN), tz)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// A due date as read from the provider: the calendar date written in
/// the string, never shifted by timezone conversion.
pub fn read_due_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split('T').next()?;
    NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()
}
