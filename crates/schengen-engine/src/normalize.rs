//! Trip normalization: raw records in, canonical [`Trip`]s and issues out.
//!
//! The normalizer is the only component that sees untrusted data. It parses
//! and day-truncates dates, recomputes durations, drops records that cannot
//! participate in compliance math, and reports every problem it finds as a
//! structured [`ValidationIssue`]. It never returns an error and never
//! panics — a record it cannot make sense of is excluded and reported, and
//! the rest of the batch keeps going.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::trip::{ExitPeriod, Trip};
use crate::window::STAY_CAP_DAYS;

/// How serious a validation issue or conflict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

/// An unvalidated exit period as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExitPeriod {
    #[serde(default)]
    pub exit_date: String,
    #[serde(default)]
    pub reentry_date: String,
}

/// An unvalidated trip record as supplied by the caller.
///
/// Dates are strings so that callers can pass data straight from forms or
/// JSON without pre-parsing; the normalizer truncates datetimes to days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrip {
    pub id: String,
    /// Territory label (country code). Required.
    #[serde(default)]
    pub country: String,
    /// `YYYY-MM-DD`, or an RFC 3339 datetime (truncated to its date part).
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// Claimed inclusive day count; checked against the dates, never trusted.
    #[serde(default)]
    pub days: Option<i64>,
    /// Sub-intervals spent outside the area. Periods that are unparseable,
    /// inverted, out of the trip's bounds, or overlapping a sibling are
    /// dropped with a warning; the trip itself is kept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit_periods: Vec<RawExitPeriod>,
}

/// One rule failure on one raw trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub trip_id: String,
    /// Which field the rule applies to (`"country"`, `"start_date"`, ...).
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(trip_id: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            field: field.to_string(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    fn warning(trip_id: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            field: field.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// The outcome of normalizing a raw batch.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedTrips {
    /// Valid trips, day-truncated and sorted by start date.
    pub trips: Vec<Trip>,
    /// Every rule failure found, including those on excluded trips.
    pub issues: Vec<ValidationIssue>,
}

/// Trips starting more than this many years before `today` are flagged.
const MAX_YEARS_PAST: i32 = 10;
/// Trips ending more than this many years after `today` are flagged.
const MAX_YEARS_FUTURE: i32 = 5;

/// Validate and sanitize a raw batch into canonical trips.
///
/// `today` anchors the plausibility checks; the caller provides it so the
/// function stays pure (no system clock access).
///
/// Error-severity issues exclude the trip from the output; warning-severity
/// issues are reported but keep the trip.
pub fn normalize_trips(raw: &[RawTrip], today: NaiveDate) -> NormalizedTrips {
    let mut trips = Vec::with_capacity(raw.len());
    let mut issues = Vec::new();

    for record in raw {
        if record.id.is_empty() {
            issues.push(ValidationIssue::error("", "id", "trip id is missing"));
            continue;
        }
        if record.country.trim().is_empty() {
            issues.push(ValidationIssue::error(
                &record.id,
                "country",
                "country is missing",
            ));
            continue;
        }

        let start = match parse_day(&record.start_date) {
            Some(d) => d,
            None => {
                issues.push(ValidationIssue::error(
                    &record.id,
                    "start_date",
                    format!("unparseable start date '{}'", record.start_date),
                ));
                continue;
            }
        };
        let end = match parse_day(&record.end_date) {
            Some(d) => d,
            None => {
                issues.push(ValidationIssue::error(
                    &record.id,
                    "end_date",
                    format!("unparseable end date '{}'", record.end_date),
                ));
                continue;
            }
        };

        if end < start {
            issues.push(ValidationIssue::error(
                &record.id,
                "end_date",
                format!("end date {} precedes start date {}", end, start),
            ));
            continue;
        }

        let duration = (end - start).num_days() + 1;
        if duration > STAY_CAP_DAYS {
            // A single stay over the cap is impossible under the rule itself.
            issues.push(ValidationIssue::error(
                &record.id,
                "end_date",
                format!(
                    "single stay of {} days exceeds the {}-day cap",
                    duration, STAY_CAP_DAYS
                ),
            ));
            continue;
        }

        if let Some(limit) = shift_years(today, -MAX_YEARS_PAST) {
            if start < limit {
                issues.push(ValidationIssue::warning(
                    &record.id,
                    "start_date",
                    format!("start date {} is more than {} years in the past", start, MAX_YEARS_PAST),
                ));
            }
        }
        if let Some(limit) = shift_years(today, MAX_YEARS_FUTURE) {
            if end > limit {
                issues.push(ValidationIssue::warning(
                    &record.id,
                    "end_date",
                    format!("end date {} is more than {} years in the future", end, MAX_YEARS_FUTURE),
                ));
            }
        }

        if let Some(claimed) = record.days {
            if claimed != duration {
                issues.push(ValidationIssue::warning(
                    &record.id,
                    "days",
                    format!("claimed {} days but dates span {} days", claimed, duration),
                ));
            }
        }

        match Trip::new(&record.id, record.country.trim(), start, end) {
            Ok(mut trip) => {
                trip.exit_periods = sanitize_exit_periods(record, start, end, &mut issues);
                trips.push(trip);
            }
            // Unreachable after the end < start check, but degrade to
            // exclusion rather than panicking if it ever fires.
            Err(e) => issues.push(ValidationIssue::error(
                &record.id,
                "start_date",
                e.to_string(),
            )),
        }
    }

    trips.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));

    NormalizedTrips { trips, issues }
}

/// Parse, validate, and sort a raw trip's exit periods; each bad period is
/// dropped with a warning while the trip itself stays in the batch.
fn sanitize_exit_periods(
    record: &RawTrip,
    start: NaiveDate,
    end: NaiveDate,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<ExitPeriod> {
    let mut periods = Vec::with_capacity(record.exit_periods.len());
    for raw in &record.exit_periods {
        let (Some(exit), Some(reentry)) =
            (parse_day(&raw.exit_date), parse_day(&raw.reentry_date))
        else {
            issues.push(ValidationIssue::warning(
                &record.id,
                "exit_periods",
                format!(
                    "unparseable exit period '{}'..'{}', dropped",
                    raw.exit_date, raw.reentry_date
                ),
            ));
            continue;
        };
        if reentry < exit {
            issues.push(ValidationIssue::warning(
                &record.id,
                "exit_periods",
                format!("reentry {} precedes exit {}, period dropped", reentry, exit),
            ));
            continue;
        }
        if exit < start || reentry > end {
            issues.push(ValidationIssue::warning(
                &record.id,
                "exit_periods",
                format!(
                    "exit period {}..{} falls outside the trip, dropped",
                    exit, reentry
                ),
            ));
            continue;
        }
        periods.push(ExitPeriod {
            exit_date: exit,
            reentry_date: reentry,
        });
    }

    periods.sort_by_key(|p| p.exit_date);
    let mut kept: Vec<ExitPeriod> = Vec::with_capacity(periods.len());
    for period in periods {
        if let Some(prev) = kept.last() {
            if period.exit_date <= prev.reentry_date {
                issues.push(ValidationIssue::warning(
                    &record.id,
                    "exit_periods",
                    format!(
                        "exit period {}..{} overlaps {}..{}, dropped",
                        period.exit_date, period.reentry_date, prev.exit_date, prev.reentry_date
                    ),
                ));
                continue;
            }
        }
        kept.push(period);
    }
    kept
}

/// Parse a day, truncating any datetime to its date part.
fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // RFC 3339 / ISO 8601 datetime: the date is the first ten characters.
    if s.len() > 10 && s.as_bytes().get(10) == Some(&b'T') {
        return NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").ok();
    }
    None
}

/// Shift a date by whole years; Feb 29 falls back to Feb 28.
fn shift_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}
