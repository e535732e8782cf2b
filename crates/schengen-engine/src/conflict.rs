//! Trip-conflict detection: structural problems in the trip set itself.
//!
//! Conflicts are independent of rolling-window compliance. The aggregator
//! tolerates overlapping trips by deduplicating days; the detector flags the
//! overlap as a data problem anyway, because two simultaneous stays cannot
//! both be physically real. All checks run unconditionally and their results
//! are concatenated — no short-circuiting.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::normalize::Severity;
use crate::trip::{DateRange, Trip};
use crate::window::{days_used_in_window, trip_days_in_window, window_start, STAY_CAP_DAYS};

/// Minimum comfortable gap between consecutive trips, in calendar days.
const MIN_GAP_DAYS: i64 = 3;

/// Adjacent trips separated by at most this gap merge into one run for the
/// consecutive-stay check.
const RUN_MERGE_GAP_DAYS: i64 = 1;

/// Projected usage within this many days of the cap is flagged as risk.
const RISK_MARGIN_DAYS: i64 = 10;

/// The fixed conflict taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    InvalidDateOrder,
    /// Legacy wording for an overlap; emitted alongside [`Self::DateOverlap`].
    OverlappingTrips,
    /// User-facing wording for the same overlapping pair.
    DateOverlap,
    InsufficientGap,
    ConsecutiveStayViolation,
    #[serde(rename = "EXCEEDS_180_DAY_PERIOD")]
    Exceeds180DayPeriod,
    FutureViolationRisk,
}

/// One detected incompatibility between trips (or within a single trip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripConflict {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub trip_ids: Vec<String>,
    pub message: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_dates: Option<DateRange>,
}

/// All conflicts found in a trip set, with severity rollups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub conflicts: Vec<TripConflict>,
    pub has_errors: bool,
    pub has_warnings: bool,
}

impl ConflictReport {
    fn from_conflicts(conflicts: Vec<TripConflict>) -> Self {
        let has_errors = conflicts.iter().any(|c| c.severity == Severity::Error);
        let has_warnings = conflicts.iter().any(|c| c.severity == Severity::Warning);
        Self {
            conflicts,
            has_errors,
            has_warnings,
        }
    }
}

/// Run every conflict check over the trip set.
///
/// `today` anchors the future-violation projection; the caller supplies it
/// so the detector stays a pure function.
pub fn detect_conflicts(trips: &[Trip], today: NaiveDate) -> ConflictReport {
    let mut sorted: Vec<&Trip> = trips.iter().collect();
    sorted.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));

    let mut conflicts = Vec::new();
    check_date_order(&sorted, &mut conflicts);
    check_overlaps(&sorted, &mut conflicts);
    check_gaps(&sorted, &mut conflicts);
    check_consecutive_stays(&sorted, &mut conflicts);
    check_window_totals(trips, &sorted, &mut conflicts);
    check_future_risk(trips, &sorted, today, &mut conflicts);

    ConflictReport::from_conflicts(conflicts)
}

fn check_date_order(sorted: &[&Trip], conflicts: &mut Vec<TripConflict>) {
    for trip in sorted {
        if trip.end_date < trip.start_date {
            conflicts.push(TripConflict {
                conflict_type: ConflictType::InvalidDateOrder,
                severity: Severity::Error,
                trip_ids: vec![trip.id.clone()],
                message: format!("Trip {} ends before it starts", trip.id),
                details: format!(
                    "start {} is after end {}",
                    trip.start_date, trip.end_date
                ),
                suggested_fix: Some("Swap or correct the start and end dates".to_string()),
                affected_dates: None,
            });
        }
    }
}

fn check_overlaps(sorted: &[&Trip], conflicts: &mut Vec<TripConflict>) {
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            let Some(intersection) = a.overlap_range(b) else {
                continue;
            };
            let ids = vec![a.id.clone(), b.id.clone()];
            let details = format!(
                "{}..{} intersects {}..{} on {} day(s)",
                a.start_date,
                a.end_date,
                b.start_date,
                b.end_date,
                intersection.days()
            );
            // Both the legacy and the user-facing variant are emitted for
            // the same pair; downstream consumers key on either.
            conflicts.push(TripConflict {
                conflict_type: ConflictType::OverlappingTrips,
                severity: Severity::Error,
                trip_ids: ids.clone(),
                message: format!("Trips {} and {} overlap", a.id, b.id),
                details: details.clone(),
                suggested_fix: Some("Adjust the dates so the trips do not overlap".to_string()),
                affected_dates: Some(intersection),
            });
            conflicts.push(TripConflict {
                conflict_type: ConflictType::DateOverlap,
                severity: Severity::Error,
                trip_ids: ids,
                message: format!(
                    "You cannot be in two places at once between {} and {}",
                    intersection.start, intersection.end
                ),
                details,
                suggested_fix: Some("Adjust the dates so the trips do not overlap".to_string()),
                affected_dates: Some(intersection),
            });
        }
    }
}

fn check_gaps(sorted: &[&Trip], conflicts: &mut Vec<TripConflict>) {
    for pair in sorted.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let gap = (next.start_date - current.end_date).num_days() - 1;
        // Negative gaps are overlaps, reported by check_overlaps.
        if (0..MIN_GAP_DAYS).contains(&gap) {
            conflicts.push(TripConflict {
                conflict_type: ConflictType::InsufficientGap,
                severity: Severity::Warning,
                trip_ids: vec![current.id.clone(), next.id.clone()],
                message: format!(
                    "Only {} day(s) between trips {} and {}",
                    gap, current.id, next.id
                ),
                details: format!(
                    "trip {} ends {} and trip {} starts {}",
                    current.id, current.end_date, next.id, next.start_date
                ),
                suggested_fix: Some(format!(
                    "Allow at least {} days between trips",
                    MIN_GAP_DAYS
                )),
                affected_dates: Some(DateRange::new(current.end_date, next.start_date)),
            });
        }
    }
}

fn check_consecutive_stays(sorted: &[&Trip], conflicts: &mut Vec<TripConflict>) {
    // (a) a single stay over the cap
    for trip in sorted {
        let duration = trip.duration_days();
        if duration > STAY_CAP_DAYS {
            conflicts.push(TripConflict {
                conflict_type: ConflictType::ConsecutiveStayViolation,
                severity: Severity::Error,
                trip_ids: vec![trip.id.clone()],
                message: format!(
                    "Trip {} lasts {} days, over the {}-day limit for a single stay",
                    trip.id, duration, STAY_CAP_DAYS
                ),
                details: format!("{}..{}", trip.start_date, trip.end_date),
                suggested_fix: Some(format!(
                    "Shorten the stay to at most {} days",
                    STAY_CAP_DAYS
                )),
                affected_dates: Some(DateRange::new(trip.start_date, trip.end_date)),
            });
        }
    }

    // (b) a run of back-to-back trips whose combined span exceeds the cap
    let mut i = 0;
    while i < sorted.len() {
        let run_start = sorted[i].start_date;
        let mut run_end = sorted[i].end_date;
        let mut run_ids = vec![sorted[i].id.clone()];
        let mut j = i + 1;
        while j < sorted.len() {
            let gap = (sorted[j].start_date - run_end).num_days() - 1;
            if gap > RUN_MERGE_GAP_DAYS {
                break;
            }
            run_end = run_end.max(sorted[j].end_date);
            run_ids.push(sorted[j].id.clone());
            j += 1;
        }

        let span = (run_end - run_start).num_days() + 1;
        if run_ids.len() > 1 && span > STAY_CAP_DAYS {
            conflicts.push(TripConflict {
                conflict_type: ConflictType::ConsecutiveStayViolation,
                severity: Severity::Error,
                trip_ids: run_ids.clone(),
                message: format!(
                    "{} back-to-back trips span {} days, over the {}-day limit",
                    run_ids.len(),
                    span,
                    STAY_CAP_DAYS
                ),
                details: format!("combined span {}..{}", run_start, run_end),
                suggested_fix: Some("Insert a longer break between the trips".to_string()),
                affected_dates: Some(DateRange::new(run_start, run_end)),
            });
        }
        i = j.max(i + 1);
    }
}

fn check_window_totals(trips: &[Trip], sorted: &[&Trip], conflicts: &mut Vec<TripConflict>) {
    // Each trip's end date is a candidate window end; the same contributing
    // trip set is reported only once across trigger points.
    let mut reported: BTreeSet<Vec<String>> = BTreeSet::new();

    for trigger in sorted {
        let end = trigger.end_date;
        let total = days_used_in_window(trips, end);
        if total <= STAY_CAP_DAYS {
            continue;
        }

        let mut ids: Vec<String> = trips
            .iter()
            .filter(|t| trip_days_in_window(t, end) > 0)
            .map(|t| t.id.clone())
            .collect();
        ids.sort();
        if !reported.insert(ids.clone()) {
            continue;
        }

        conflicts.push(TripConflict {
            conflict_type: ConflictType::Exceeds180DayPeriod,
            severity: Severity::Error,
            trip_ids: ids,
            message: format!(
                "{} days used in the 180-day period ending {}, over the {}-day limit",
                total, end, STAY_CAP_DAYS
            ),
            details: format!("window {}..{}", window_start(end), end),
            suggested_fix: Some("Remove or shorten trips within this period".to_string()),
            affected_dates: Some(DateRange::new(window_start(end), end)),
        });
    }
}

fn check_future_risk(
    trips: &[Trip],
    sorted: &[&Trip],
    today: NaiveDate,
    conflicts: &mut Vec<TripConflict>,
) {
    for future in sorted.iter().filter(|t| t.start_date > today) {
        // Project usage through this trip's end using everything underway
        // by the time it starts.
        let considered: Vec<Trip> = trips
            .iter()
            .filter(|t| t.start_date <= future.start_date)
            .cloned()
            .collect();
        let projected = days_used_in_window(&considered, future.end_date);

        let severity = if projected > STAY_CAP_DAYS {
            Severity::Error
        } else if projected >= STAY_CAP_DAYS - RISK_MARGIN_DAYS {
            Severity::Warning
        } else {
            continue;
        };

        conflicts.push(TripConflict {
            conflict_type: ConflictType::FutureViolationRisk,
            severity,
            trip_ids: vec![future.id.clone()],
            message: if severity == Severity::Error {
                format!(
                    "Trip {} would put usage at {} days, over the {}-day limit",
                    future.id, projected, STAY_CAP_DAYS
                )
            } else {
                format!(
                    "Trip {} projects {} days used, within {} days of the limit",
                    future.id, projected, RISK_MARGIN_DAYS
                )
            },
            details: format!(
                "projected through {} from trips starting on or before {}",
                future.end_date, future.start_date
            ),
            suggested_fix: Some("Shorten or postpone the planned trip".to_string()),
            affected_dates: Some(DateRange::new(future.start_date, future.end_date)),
        });
    }
}
