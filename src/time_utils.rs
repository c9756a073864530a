// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar days and timestamp conversion.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Half-open instant window `[start, end)` covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Window for the calendar day `day` as observed in `tz`.
    pub fn for_day<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Self {
        let start = start_of_day(day, tz);
        let end = day
            .checked_add_days(Days::new(1))
            .map(|next| start_of_day(next, tz))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    /// Window for the calendar day containing `instant`.
    pub fn containing<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> Self {
        Self::for_day(local_day(instant, tz), tz)
    }

    /// Window from the start of `first` to the end of `last`, inclusive.
    pub fn spanning<Tz: TimeZone>(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Self {
        Self {
            start: start_of_day(first, tz),
            end: Self::for_day(last, tz).end,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Calendar day of `instant` in `tz`.
pub fn local_day<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// First instant of `day` in `tz`.
///
/// An ambiguous midnight resolves to its earlier instant. A midnight that does
/// not exist in `tz` is read as UTC.
pub fn start_of_day<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Unix milliseconds, the storage representation of instants.
pub fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Inverse of [`to_millis`]; out-of-range values clamp to the epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
