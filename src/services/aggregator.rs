// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily aggregation of hydration and calorie measurements.
//!
//! All functions are pure; the caller supplies the instant that defines
//! "today" and the time zone that decides where days begin.

use crate::models::Measurement;
use crate::time_utils::{local_day, DayWindow};
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Sum of the amounts recorded during the calendar day containing `as_of`.
///
/// Records outside `[start_of_day(as_of), start_of_day(as_of) + 24h)` and
/// records with a non-finite amount are ignored. The result does not depend
/// on the order of `records`.
pub fn daily_total<Tz: TimeZone>(records: &[Measurement], as_of: DateTime<Utc>, tz: &Tz) -> f64 {
    let window = DayWindow::containing(as_of, tz);
    sum_amounts(
        records
            .iter()
            .filter(|m| window.contains(m.recorded_at))
            .map(|m| m.amount),
    )
}

/// Per-day totals keyed by calendar day in `tz`.
pub fn totals_by_day<Tz: TimeZone>(records: &[Measurement], tz: &Tz) -> BTreeMap<NaiveDate, f64> {
    let mut grouped: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for m in records.iter().filter(|m| m.amount.is_finite()) {
        grouped
            .entry(local_day(m.recorded_at, tz))
            .or_default()
            .push(m.amount);
    }

    grouped
        .into_iter()
        .map(|(day, amounts)| (day, sum_amounts(amounts.into_iter())))
        .collect()
}

/// Number of consecutive calendar days, ending at `today`, that have at
/// least one record. Zero when `today` itself has none.
pub fn consecutive_days_logged<Tz: TimeZone>(
    records: &[Measurement],
    today: NaiveDate,
    tz: &Tz,
) -> u32 {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|m| m.amount.is_finite())
        .map(|m| local_day(m.recorded_at, tz))
        .collect();

    let mut count = 0;
    let mut day = today;
    while days.contains(&day) {
        count += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    count
}

/// Floating-point addition is not associative, so amounts are summed in a
/// canonical order.
fn sum_amounts(amounts: impl Iterator<Item = f64>) -> f64 {
    let mut finite: Vec<f64> = amounts.filter(|a| a.is_finite()).collect();
    finite.sort_by(f64::total_cmp);
    // Fold from +0.0 so an empty day reports 0 rather than -0.
    finite.into_iter().fold(0.0, |total, amount| total + amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(s: &str, amount: f64) -> Measurement {
        Measurement {
            amount,
            recorded_at: DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc),
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_empty_input_is_zero() {
        let total = daily_total(&[], utc("2026-03-10T12:00:00Z"), &Utc);
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
    }

    #[test]
    fn test_excludes_previous_day() {
        let records = vec![
            at("2026-03-09T23:59:59Z", 0.5),
            at("2026-03-10T00:00:01Z", 0.25),
        ];
        let total = daily_total(&records, utc("2026-03-10T12:00:00Z"), &Utc);
        assert_eq!(total, 0.25);
    }

    #[test]
    fn test_excludes_next_midnight() {
        let records = vec![
            at("2026-03-10T00:00:00Z", 1.0),
            at("2026-03-11T00:00:00Z", 2.0),
        ];
        assert_eq!(daily_total(&records, utc("2026-03-10T08:00:00Z"), &Utc), 1.0);
    }

    #[test]
    fn test_reordering_does_not_change_total() {
        let mut records = vec![
            at("2026-03-10T08:00:00Z", 0.1),
            at("2026-03-10T09:00:00Z", 0.2),
            at("2026-03-10T10:00:00Z", 0.3),
            at("2026-03-10T11:00:00Z", 1e-9),
            at("2026-03-10T12:00:00Z", 123.456),
        ];
        let as_of = utc("2026-03-10T20:00:00Z");
        let forward = daily_total(&records, as_of, &Utc);
        records.reverse();
        assert_eq!(daily_total(&records, as_of, &Utc).to_bits(), forward.to_bits());
        records.swap(0, 3);
        assert_eq!(daily_total(&records, as_of, &Utc).to_bits(), forward.to_bits());
    }

    #[test]
    fn test_non_finite_amounts_are_skipped() {
        let records = vec![
            at("2026-03-10T08:00:00Z", f64::NAN),
            at("2026-03-10T09:00:00Z", f64::INFINITY),
            at("2026-03-10T10:00:00Z", 0.5),
        ];
        assert_eq!(daily_total(&records, utc("2026-03-10T12:00:00Z"), &Utc), 0.5);
    }

    #[test]
    fn test_day_follows_time_zone() {
        // At UTC-3 the local day of 2026-03-10T12:00Z starts at 03:00Z.
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let records = vec![
            at("2026-03-10T02:59:59Z", 1.0),
            at("2026-03-10T03:00:00Z", 2.0),
        ];
        assert_eq!(daily_total(&records, utc("2026-03-10T12:00:00Z"), &tz), 2.0);
    }

    #[test]
    fn test_totals_by_day() {
        let records = vec![
            at("2026-03-09T10:00:00Z", 1.0),
            at("2026-03-10T10:00:00Z", 0.75),
            at("2026-03-10T18:00:00Z", 1.5),
        ];
        let totals = totals_by_day(&records, &Utc);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()], 2.25);
    }

    #[test]
    fn test_consecutive_days_logged() {
        let records = vec![
            at("2026-03-08T10:00:00Z", 100.0),
            at("2026-03-09T10:00:00Z", 100.0),
            at("2026-03-10T10:00:00Z", 100.0),
            at("2026-03-06T10:00:00Z", 100.0),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(consecutive_days_logged(&records, today, &Utc), 3);

        let tomorrow = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        assert_eq!(consecutive_days_logged(&records, tomorrow, &Utc), 0);
    }
}
