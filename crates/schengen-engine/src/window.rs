//! Rolling-window day arithmetic: the raw, additive evaluator.
//!
//! The Schengen rule caps presence at [`STAY_CAP_DAYS`] days within any
//! trailing [`WINDOW_DAYS`]-day window. This module computes how many
//! trip-days fall inside one such window by interval overlap, which is
//! **additive across overlapping trips**: two trips covering the same
//! calendar day each contribute that day to the sum. The day-deduplicated
//! count the canonical compliance check uses lives in [`crate::compliance`];
//! both behaviors exist in this domain and are deliberately kept as two
//! distinct named operations.

use chrono::{Days, NaiveDate};

use crate::trip::Trip;

/// Maximum days of presence allowed within any rolling window.
pub const STAY_CAP_DAYS: i64 = 90;

/// Length of the rolling window in calendar days, end day included.
pub const WINDOW_DAYS: i64 = 180;

/// First day of the window ending at `end` (inclusive on both sides, so
/// the window spans exactly [`WINDOW_DAYS`] calendar days).
pub fn window_start(end: NaiveDate) -> NaiveDate {
    end.checked_sub_days(Days::new((WINDOW_DAYS - 1) as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// Days this trip contributes to the window ending at `end`.
///
/// The contribution is the inclusive length of the trip's overlap with the
/// window, minus `reentry − exit` days for every exit period whose own
/// overlap with that trip-overlap is non-empty (the exit day and reentry day
/// still count as present, only interior days are excluded). Clamped at
/// zero so a trip never contributes negative days.
pub fn trip_days_in_window(trip: &Trip, end: NaiveDate) -> i64 {
    let start = window_start(end);
    let overlap_start = trip.start_date.max(start);
    let overlap_end = trip.end_date.min(end);
    if overlap_end < overlap_start {
        return 0;
    }

    let mut days = (overlap_end - overlap_start).num_days() + 1;
    for period in &trip.exit_periods {
        let p_start = period.exit_date.max(overlap_start);
        let p_end = period.reentry_date.min(overlap_end);
        if p_start <= p_end {
            days -= period.excluded_days();
        }
    }
    days.max(0)
}

/// Total trip-days inside the window ending at `end`, summed per trip.
///
/// This is raw day-occupancy: overlapping trips double-count shared days.
/// Use [`crate::compliance::evaluate`] when a day must count at most once.
pub fn days_used_in_window(trips: &[Trip], end: NaiveDate) -> i64 {
    trips.iter().map(|t| trip_days_in_window(t, end)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::ExitPeriod;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn trip(id: &str, start: NaiveDate, end: NaiveDate) -> Trip {
        Trip::new(id, "DE", start, end).unwrap()
    }

    #[test]
    fn test_window_spans_180_days_inclusive() {
        let end = d(2026, 6, 29);
        let start = window_start(end);
        assert_eq!((end - start).num_days() + 1, 180);
        assert_eq!(start, d(2026, 1, 1));
    }

    #[test]
    fn test_trip_fully_inside_window() {
        let t = trip("t", d(2026, 3, 1), d(2026, 3, 31));
        assert_eq!(trip_days_in_window(&t, d(2026, 4, 1)), 31);
    }

    #[test]
    fn test_trip_clipped_at_window_start() {
        let end = d(2026, 6, 29); // window starts Jan 1
        let t = trip("t", d(2025, 12, 25), d(2026, 1, 5));
        assert_eq!(trip_days_in_window(&t, end), 5); // Jan 1..Jan 5
    }

    #[test]
    fn test_trip_clipped_at_window_end() {
        let end = d(2026, 6, 29);
        let t = trip("t", d(2026, 6, 25), d(2026, 7, 10));
        assert_eq!(trip_days_in_window(&t, end), 5); // Jun 25..Jun 29
    }

    #[test]
    fn test_day_exactly_180_before_counts() {
        let end = d(2026, 6, 29);
        let t = trip("t", d(2026, 1, 1), d(2026, 1, 1));
        assert_eq!(trip_days_in_window(&t, end), 1);
    }

    #[test]
    fn test_day_181_before_does_not_count() {
        let end = d(2026, 6, 29);
        let t = trip("t", d(2025, 12, 31), d(2025, 12, 31));
        assert_eq!(trip_days_in_window(&t, end), 0);
    }

    #[test]
    fn test_sum_is_additive_across_overlapping_trips() {
        // [1,5] and [3,8] share three days; the raw sum counts them twice.
        let a = trip("a", d(2026, 3, 1), d(2026, 3, 5));
        let b = trip("b", d(2026, 3, 3), d(2026, 3, 8));
        assert_eq!(days_used_in_window(&[a, b], d(2026, 4, 1)), 11);
    }

    #[test]
    fn test_exit_period_subtracted() {
        let mut t = trip("t", d(2026, 3, 1), d(2026, 3, 31));
        t.exit_periods = vec![ExitPeriod::new(d(2026, 3, 10), d(2026, 3, 15)).unwrap()];
        // 31 − (15 − 10) = 26
        assert_eq!(trip_days_in_window(&t, d(2026, 4, 1)), 26);
    }

    #[test]
    fn test_exit_period_outside_window_overlap_ignored() {
        // Window ends Mar 5, so the trip's window-overlap is Mar 1..Mar 5;
        // an exit period later in the trip must not be subtracted.
        let mut t = trip("t", d(2026, 3, 1), d(2026, 3, 31));
        t.exit_periods = vec![ExitPeriod::new(d(2026, 3, 20), d(2026, 3, 25)).unwrap()];
        assert_eq!(trip_days_in_window(&t, d(2026, 3, 5)), 5);
    }

    #[test]
    fn test_same_day_exit_period_subtracts_nothing() {
        let mut t = trip("t", d(2026, 3, 1), d(2026, 3, 31));
        t.exit_periods = vec![ExitPeriod::new(d(2026, 3, 10), d(2026, 3, 10)).unwrap()];
        assert_eq!(trip_days_in_window(&t, d(2026, 4, 1)), 31);
    }

    #[test]
    fn test_contribution_clamped_at_zero() {
        // Exit period spanning nearly the whole trip while the window only
        // sees a sliver of it; the clamp keeps the contribution at zero.
        let mut t = trip("t", d(2026, 1, 1), d(2026, 3, 31));
        t.exit_periods = vec![ExitPeriod::new(d(2026, 1, 2), d(2026, 3, 30)).unwrap()];
        assert_eq!(trip_days_in_window(&t, d(2026, 1, 5)), 0);
    }

    #[test]
    fn test_empty_collection_is_zero() {
        assert_eq!(days_used_in_window(&[], d(2026, 4, 1)), 0);
    }
}
