//! Core data model: trips, exit periods, and date ranges.
//!
//! A [`Trip`] is a closed day-granularity interval of physical presence in
//! the Schengen area. An [`ExitPeriod`] carves a sub-interval out of a trip
//! during which the traveler was outside the area (e.g., a side trip to the
//! UK in the middle of a longer European stay). Only the strictly interior
//! days of an exit period are excluded from presence — the exit day and the
//! reentry day both count, because the traveler was inside the area for at
//! least part of them.
//!
//! All values here are immutable records. Operations that "modify" a trip
//! collection ([`with_exit_periods`]) return a new collection and leave the
//! caller's data untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A closed, inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive day count of the range.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A sub-interval of a trip spent outside the Schengen area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPeriod {
    /// Day the traveler left the area (still counts as present).
    pub exit_date: NaiveDate,
    /// Day the traveler returned (also counts as present).
    pub reentry_date: NaiveDate,
}

impl ExitPeriod {
    pub fn new(exit_date: NaiveDate, reentry_date: NaiveDate) -> Result<Self> {
        if reentry_date < exit_date {
            return Err(EngineError::InvalidExitPeriod(format!(
                "reentry {} precedes exit {}",
                reentry_date, exit_date
            )));
        }
        Ok(Self {
            exit_date,
            reentry_date,
        })
    }

    /// Days subtracted from a trip's window contribution when this period
    /// overlaps it (`reentry − exit`; a same-day hop subtracts nothing).
    pub fn excluded_days(&self) -> i64 {
        (self.reentry_date - self.exit_date).num_days()
    }
}

/// A single stay in the Schengen area, as a closed date interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier within a collection.
    pub id: String,
    /// Free-form territory label (country code); not used in compliance math.
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive day count. Informational — always recomputed from the dates.
    pub days: i64,
    /// Ordered, non-overlapping sub-intervals spent outside the area.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit_periods: Vec<ExitPeriod>,
}

impl Trip {
    /// Build a trip, enforcing `start_date ≤ end_date`.
    pub fn new(
        id: impl Into<String>,
        country: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self> {
        if end_date < start_date {
            return Err(EngineError::InvalidDateRange(format!(
                "end {} precedes start {}",
                end_date, start_date
            )));
        }
        Ok(Self {
            id: id.into(),
            country: country.into(),
            start_date,
            end_date,
            days: (end_date - start_date).num_days() + 1,
            exit_periods: Vec::new(),
        })
    }

    /// Inclusive duration of the trip in days, recomputed from the dates.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Whether the traveler was physically present on `day`.
    ///
    /// True when `day` lies inside the trip and is not strictly interior to
    /// an exit period (exit and reentry days both count as present).
    pub fn occupies(&self, day: NaiveDate) -> bool {
        if day < self.start_date || day > self.end_date {
            return false;
        }
        !self
            .exit_periods
            .iter()
            .any(|p| p.exit_date < day && day < p.reentry_date)
    }

    /// Whether this trip's interval intersects `other`'s.
    pub fn overlaps(&self, other: &Trip) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// The intersection of the two trip intervals, if non-empty.
    pub fn overlap_range(&self, other: &Trip) -> Option<DateRange> {
        let start = self.start_date.max(other.start_date);
        let end = self.end_date.min(other.end_date);
        (start <= end).then_some(DateRange { start, end })
    }
}

/// Return a new collection with the exit periods of the trip identified by
/// `trip_id` replaced by `periods`. The input collection is never mutated.
///
/// # Errors
///
/// - [`EngineError::UnknownTrip`] if no trip carries `trip_id` — a boundary
///   programming error, not bad travel data.
/// - [`EngineError::InvalidExitPeriod`] if a period is inverted, falls outside
///   the trip, or overlaps a sibling period.
pub fn with_exit_periods(
    trips: &[Trip],
    trip_id: &str,
    periods: Vec<ExitPeriod>,
) -> Result<Vec<Trip>> {
    let target = trips
        .iter()
        .find(|t| t.id == trip_id)
        .ok_or_else(|| EngineError::UnknownTrip(trip_id.to_string()))?;

    let mut sorted = periods;
    sorted.sort_by_key(|p| p.exit_date);

    for p in &sorted {
        if p.reentry_date < p.exit_date {
            return Err(EngineError::InvalidExitPeriod(format!(
                "reentry {} precedes exit {}",
                p.reentry_date, p.exit_date
            )));
        }
        if p.exit_date < target.start_date || p.reentry_date > target.end_date {
            return Err(EngineError::InvalidExitPeriod(format!(
                "period {}..{} falls outside trip {} ({}..{})",
                p.exit_date, p.reentry_date, target.id, target.start_date, target.end_date
            )));
        }
    }
    for pair in sorted.windows(2) {
        if pair[1].exit_date <= pair[0].reentry_date {
            return Err(EngineError::InvalidExitPeriod(format!(
                "periods {}..{} and {}..{} overlap",
                pair[0].exit_date, pair[0].reentry_date, pair[1].exit_date, pair[1].reentry_date
            )));
        }
    }

    Ok(trips
        .iter()
        .map(|t| {
            if t.id == trip_id {
                let mut updated = t.clone();
                updated.exit_periods = sorted.clone();
                updated
            } else {
                t.clone()
            }
        })
        .collect())
}
