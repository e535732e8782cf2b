//! Forward and backward date-search utilities built on the window evaluator.
//!
//! Every search here is internally bounded: stay extension never runs past
//! the cap itself, and date-range scans stop after [`PLANNER_SCAN_LIMIT`]
//! candidate days, so pathological inputs cannot cause unbounded scanning.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::trip::Trip;
use crate::window::{days_used_in_window, STAY_CAP_DAYS};

/// Hard ceiling on candidate start dates examined by a range scan
/// (three years of daily candidates).
pub const PLANNER_SCAN_LIMIT: usize = 1096;

/// Suggestions returned by [`find_optimal_dates`], best first.
const MAX_SUGGESTIONS: usize = 10;

/// How close a planned stay runs to the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn from_buffer(buffer_days: i64) -> Self {
        if buffer_days < 5 {
            RiskLevel::High
        } else if buffer_days < 15 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn penalty(self) -> i64 {
        match self {
            RiskLevel::High => 30,
            RiskLevel::Medium => 10,
            RiskLevel::Low => 0,
        }
    }
}

/// A scored candidate date range for a planned stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSuggestion {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Longest compliant stay possible from `start_date`.
    pub available_days: i64,
    /// Cap headroom left after the desired stay ends.
    pub buffer_days: i64,
    pub risk: RiskLevel,
    pub score: i64,
}

/// The longest stay starting at `start` that keeps every day of its own
/// span under the cap, extended one day at a time and never past
/// [`STAY_CAP_DAYS`]. Zero when even a single day would breach.
pub fn max_consecutive_days_from(trips: &[Trip], start: NaiveDate) -> i64 {
    let mut longest = 0;
    for length in 1..=STAY_CAP_DAYS {
        let Some(day) = start.checked_add_days(Days::new((length - 1) as u64)) else {
            break;
        };
        // The whole hypothetical stay sits inside the window ending at its
        // own last day (length ≤ cap < window), so it contributes `length`.
        let usage = days_used_in_window(trips, day) + length;
        if usage > STAY_CAP_DAYS {
            break;
        }
        longest = length;
    }
    longest
}

/// Scanning backward from `latest` to `earliest`, the first start date at
/// which a stay of `length` days is fully compliant. `None` when no date in
/// range works, `length` is out of `1..=90`, or the range is inverted.
pub fn latest_valid_start_date(
    trips: &[Trip],
    length: i64,
    earliest: NaiveDate,
    latest: NaiveDate,
) -> Option<NaiveDate> {
    if !(1..=STAY_CAP_DAYS).contains(&length) || latest < earliest {
        return None;
    }
    let mut day = latest;
    for _ in 0..PLANNER_SCAN_LIMIT {
        if day < earliest {
            break;
        }
        if max_consecutive_days_from(trips, day) >= length {
            return Some(day);
        }
        day = day.pred_opt()?;
    }
    None
}

/// Score every start date in `[earliest, latest]` that can host a stay of
/// `desired_days`, and return the best candidates first.
///
/// Scoring favors slack: extra availability beyond the desired stay, cap
/// headroom after the stay ends, a penalty when the stay runs close to the
/// cap, and a small bonus when at least a week of flexibility remains.
pub fn find_optimal_dates(
    trips: &[Trip],
    desired_days: i64,
    earliest: NaiveDate,
    latest: NaiveDate,
) -> Vec<DateSuggestion> {
    if !(1..=STAY_CAP_DAYS).contains(&desired_days) || latest < earliest {
        return Vec::new();
    }

    let mut suggestions = Vec::new();
    for start in earliest
        .iter_days()
        .take_while(|d| *d <= latest)
        .take(PLANNER_SCAN_LIMIT)
    {
        let available = max_consecutive_days_from(trips, start);
        if available < desired_days {
            continue;
        }
        let Some(end) = start.checked_add_days(Days::new((desired_days - 1) as u64)) else {
            continue;
        };

        let usage_after = days_used_in_window(trips, end) + desired_days;
        let buffer_days = (STAY_CAP_DAYS - usage_after).max(0);
        let risk = RiskLevel::from_buffer(buffer_days);
        let flex_bonus = if available >= desired_days + 7 { 5 } else { 0 };
        let score = 2 * (available - desired_days) + 3 * buffer_days - risk.penalty() + flex_bonus;

        suggestions.push(DateSuggestion {
            start_date: start,
            end_date: end,
            available_days: available,
            buffer_days,
            risk,
            score,
        });
    }

    suggestions.sort_by(|a, b| b.score.cmp(&a.score).then(a.start_date.cmp(&b.start_date)));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn trip(id: &str, start: NaiveDate, end: NaiveDate) -> Trip {
        Trip::new(id, "NL", start, end).unwrap()
    }

    #[test]
    fn test_max_days_with_no_trips_is_cap() {
        assert_eq!(max_consecutive_days_from(&[], d(2026, 1, 1)), 90);
    }

    #[test]
    fn test_max_days_with_existing_usage() {
        // 75 days used, all still in-window: 15 days left.
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 16))];
        assert_eq!(max_consecutive_days_from(&trips, d(2026, 4, 1)), 15);
    }

    #[test]
    fn test_max_days_zero_when_cap_reached() {
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 31))]; // 90 days
        assert_eq!(max_consecutive_days_from(&trips, d(2026, 4, 1)), 0);
    }

    #[test]
    fn test_max_days_grows_as_old_days_expire() {
        // The 90-day block leaves the window one day at a time from the
        // day after its start exits (Jan 1 + 180 = Jun 30).
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 31))];
        assert!(max_consecutive_days_from(&trips, d(2026, 6, 30)) > 0);
    }

    #[test]
    fn test_latest_valid_start_picks_latest() {
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 21))]; // 80 days
        let found =
            latest_valid_start_date(&trips, 15, d(2026, 6, 1), d(2026, 6, 25)).unwrap();
        assert_eq!(found, d(2026, 6, 25));
    }

    #[test]
    fn test_latest_valid_start_none_when_range_too_early() {
        // With 80 in-window days, a 15-day stay cannot end before the old
        // days start expiring; every start through Jun 18 breaches.
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 21))];
        assert!(latest_valid_start_date(&trips, 15, d(2026, 6, 1), d(2026, 6, 18)).is_none());
    }

    #[test]
    fn test_latest_valid_start_rejects_bad_arguments() {
        assert!(latest_valid_start_date(&[], 0, d(2026, 1, 1), d(2026, 2, 1)).is_none());
        assert!(latest_valid_start_date(&[], 91, d(2026, 1, 1), d(2026, 2, 1)).is_none());
        assert!(latest_valid_start_date(&[], 10, d(2026, 2, 1), d(2026, 1, 1)).is_none());
    }

    #[test]
    fn test_optimal_dates_empty_history_prefers_earliest() {
        let suggestions = find_optimal_dates(&[], 10, d(2026, 1, 1), d(2026, 1, 20));
        assert_eq!(suggestions.len(), 10);
        // All candidates score identically; the earliest start wins the tie.
        assert_eq!(suggestions[0].start_date, d(2026, 1, 1));
        assert_eq!(suggestions[0].end_date, d(2026, 1, 10));
        assert_eq!(suggestions[0].available_days, 90);
        assert_eq!(suggestions[0].risk, RiskLevel::Low);
    }

    #[test]
    fn test_optimal_dates_risk_reflects_headroom() {
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 16))]; // 75 days
        let medium = find_optimal_dates(&trips, 10, d(2026, 4, 1), d(2026, 4, 1));
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].buffer_days, 5);
        assert_eq!(medium[0].risk, RiskLevel::Medium);

        let high = find_optimal_dates(&trips, 14, d(2026, 4, 1), d(2026, 4, 1));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].buffer_days, 1);
        assert_eq!(high[0].risk, RiskLevel::High);
    }

    #[test]
    fn test_optimal_dates_skips_starts_without_room() {
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 31))]; // 90 days
        let suggestions = find_optimal_dates(&trips, 10, d(2026, 4, 1), d(2026, 4, 30));
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_optimal_dates_sorted_best_first() {
        // Usage shrinks as the old block expires, so later starts in July
        // leave more headroom and must rank higher.
        let trips = vec![trip("t", d(2026, 1, 1), d(2026, 3, 21))]; // 80 days
        let suggestions = find_optimal_dates(&trips, 5, d(2026, 6, 25), d(2026, 7, 20));
        assert!(!suggestions.is_empty());
        for pair in suggestions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(suggestions.len() <= 10);
    }

    #[test]
    fn test_optimal_dates_rejects_bad_arguments() {
        assert!(find_optimal_dates(&[], 0, d(2026, 1, 1), d(2026, 2, 1)).is_empty());
        assert!(find_optimal_dates(&[], 10, d(2026, 2, 1), d(2026, 1, 1)).is_empty());
    }
}
