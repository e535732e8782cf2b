//! Compliance aggregation: the canonical, day-deduplicated 90/180 check.
//!
//! Where [`crate::window`] sums raw interval overlaps (double-counting days
//! shared by overlapping trips), this module builds a day-presence structure
//! first: a calendar day is "used" if at least one trip occupies it, however
//! many do. The aggregator then slides the trailing window across every day
//! of the observation span, so a breach anywhere in the history is found,
//! not just one at the reference date.
//!
//! Compliance tooling must never crash a caller mid-flow: any internal fault
//! degrades to the fully-compliant zero-usage default, reported through
//! `tracing` rather than a panic or error return.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::trip::Trip;
use crate::window::{
    days_used_in_window, trip_days_in_window, window_start, STAY_CAP_DAYS, WINDOW_DAYS,
};

/// Usage of the trailing window ending at one specific day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollingWindowCheck {
    pub date: NaiveDate,
    /// Distinct used days in the window ending at `date`.
    pub days_used: i64,
    /// Trips occupying `date` itself.
    pub trip_ids: Vec<String>,
    /// Whether the window ending here exceeds the cap.
    pub is_violation: bool,
}

/// Outcome of evaluating a trip collection against a reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceResult {
    /// Distinct used days in the window ending at the reference date.
    pub total_days_used: i64,
    /// `max(0, cap − total_days_used)` — headroom as of the reference date.
    pub days_remaining: i64,
    /// False if any window in the observation span breached the cap, even
    /// when usage has since recovered. `days_remaining` reflects the present.
    pub is_compliant: bool,
    /// Worst breach over the observation span, clamped at zero.
    pub overstay_days: i64,
    /// Window boundaries for the reference-date check.
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Per-day checks across the observation span, for diagnostics only.
    pub detailed_breakdown: Vec<RollingWindowCheck>,
}

impl ComplianceResult {
    /// The conservative default: zero usage, fully compliant.
    fn safe_default(reference: NaiveDate) -> Self {
        Self {
            total_days_used: 0,
            days_remaining: STAY_CAP_DAYS,
            is_compliant: true,
            overstay_days: 0,
            period_start: window_start(reference),
            period_end: reference,
            detailed_breakdown: Vec::new(),
        }
    }
}

/// Evaluate a trip collection against the 90/180 rule as of `reference`.
///
/// The observation span is the window ending at `reference`; a trailing
/// window is evaluated for every day in it. `overstay_days` reports the
/// worst of those windows; `total_days_used` and `days_remaining` report
/// only the last one.
///
/// Never fails: an empty collection or any internal fault yields the
/// fully-compliant zero-usage default (faults are logged via `tracing`).
pub fn evaluate(trips: &[Trip], reference: NaiveDate) -> ComplianceResult {
    if trips.is_empty() {
        return ComplianceResult::safe_default(reference);
    }
    match evaluate_inner(trips, reference) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, %reference, "compliance evaluation failed, returning safe default");
            ComplianceResult::safe_default(reference)
        }
    }
}

fn evaluate_inner(trips: &[Trip], reference: NaiveDate) -> Result<ComplianceResult> {
    let period_start = checked_back(reference, WINDOW_DAYS - 1)?;
    // Windows evaluated early in the span reach back before period_start,
    // so presence is tracked one full window further back.
    let presence_start = checked_back(period_start, WINDOW_DAYS - 1)?;

    let occupants = build_day_presence(trips, presence_start, reference);

    // Seed the count for the window ending at period_start, then slide:
    // each step admits the new end day and retires the day that left.
    let mut days_used = occupants.range(presence_start..=period_start).count() as i64;

    let mut breakdown = Vec::with_capacity(WINDOW_DAYS as usize);
    let mut overstay_days = 0;

    for day in period_start.iter_days().take_while(|d| *d <= reference) {
        if day > period_start {
            if occupants.contains_key(&day) {
                days_used += 1;
            }
            let leaving = checked_back(day, WINDOW_DAYS)?;
            if occupants.contains_key(&leaving) {
                days_used -= 1;
            }
        }

        overstay_days = overstay_days.max(days_used - STAY_CAP_DAYS);
        breakdown.push(RollingWindowCheck {
            date: day,
            days_used,
            trip_ids: occupants.get(&day).cloned().unwrap_or_default(),
            is_violation: days_used > STAY_CAP_DAYS,
        });
    }

    let last = breakdown
        .last()
        .ok_or_else(|| EngineError::DateArithmetic("empty observation span".to_string()))?;
    let total_days_used = last.days_used;
    let overstay_days = overstay_days.max(0);

    Ok(ComplianceResult {
        total_days_used,
        days_remaining: (STAY_CAP_DAYS - total_days_used).max(0),
        is_compliant: overstay_days == 0,
        overstay_days,
        period_start,
        period_end: reference,
        detailed_breakdown: breakdown,
    })
}

/// Map each used day in `[from, to]` to the trips occupying it.
fn build_day_presence(
    trips: &[Trip],
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<NaiveDate, Vec<String>> {
    let mut occupants: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    for trip in trips {
        let clip_start = trip.start_date.max(from);
        let clip_end = trip.end_date.min(to);
        if clip_end < clip_start {
            continue;
        }
        for day in clip_start.iter_days().take_while(|d| *d <= clip_end) {
            if trip.occupies(day) {
                occupants.entry(day).or_default().push(trip.id.clone());
            }
        }
    }
    occupants
}

/// The next date on which window usage will decrease: the earliest used day
/// in the current window exits the window exactly [`WINDOW_DAYS`] days after
/// it occurred. `None` when the current window contains no used day.
pub fn next_reset_date(trips: &[Trip], reference: NaiveDate) -> Option<NaiveDate> {
    let start = window_start(reference);
    let earliest_used = start
        .iter_days()
        .take_while(|d| *d <= reference)
        .find(|d| trips.iter().any(|t| t.occupies(*d)))?;
    earliest_used.checked_add_days(Days::new(WINDOW_DAYS as u64))
}

/// Outcome of checking a hypothetical trip against an existing collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTripCheck {
    pub is_valid: bool,
    /// Days of the candidate span on which the window would exceed the cap.
    pub violation_days: i64,
    /// First such day, if any.
    pub violation_date: Option<NaiveDate>,
}

/// Check whether adding `candidate` to `existing` keeps every day of the
/// candidate's span under the cap, using the raw window sum per day.
pub fn validate_planned_trip(existing: &[Trip], candidate: &Trip) -> PlannedTripCheck {
    let mut violation_days = 0;
    let mut violation_date = None;

    for day in candidate
        .start_date
        .iter_days()
        .take_while(|d| *d <= candidate.end_date)
    {
        let usage = days_used_in_window(existing, day) + trip_days_in_window(candidate, day);
        if usage > STAY_CAP_DAYS {
            violation_days += 1;
            violation_date.get_or_insert(day);
        }
    }

    PlannedTripCheck {
        is_valid: violation_days == 0,
        violation_days,
        violation_date,
    }
}

fn checked_back(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(days as u64))
        .ok_or_else(|| EngineError::DateArithmetic(format!("{} - {} days", date, days)))
}
