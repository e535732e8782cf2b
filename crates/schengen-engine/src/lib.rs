//! # schengen-engine
//!
//! Deterministic Schengen 90/180 residency computation.
//!
//! The engine decides whether a traveler's discrete visit intervals comply
//! with the "at most 90 days within any trailing 180-day window" rule, flags
//! structural problems in the trip data, and searches for compliant travel
//! dates. Every operation is a pure, synchronous function of its inputs —
//! no system clock, no I/O, no shared mutable state; the caller supplies
//! "today" wherever an anchor is needed, keeping everything testable.
//!
//! ## Modules
//!
//! - [`normalize`] — raw trip records → canonical trips + validation issues
//! - [`window`] — raw (additive) trailing-window day arithmetic
//! - [`compliance`] — day-deduplicated rolling-window evaluation, reset
//!   dates, planned-trip checking
//! - [`conflict`] — trip-combination conflict taxonomy (overlaps, gaps,
//!   duration and window violations, projected future risk)
//! - [`planner`] — forward/backward date search and scored suggestions
//! - [`trip`] — the trip/exit-period data model
//! - [`error`] — error types
//!
//! ## Two counting modes
//!
//! [`window::days_used_in_window`] sums interval overlaps per trip and is
//! additive across overlapping trips; [`compliance::evaluate`] deduplicates
//! at day level (a calendar day counts at most once, however many trips
//! touch it). Both are part of the domain — do not substitute one for the
//! other.

pub mod compliance;
pub mod conflict;
pub mod error;
pub mod normalize;
pub mod planner;
pub mod trip;
pub mod window;

pub use compliance::{
    evaluate, next_reset_date, validate_planned_trip, ComplianceResult, PlannedTripCheck,
    RollingWindowCheck,
};
pub use conflict::{detect_conflicts, ConflictReport, ConflictType, TripConflict};
pub use error::EngineError;
pub use normalize::{
    normalize_trips, NormalizedTrips, RawExitPeriod, RawTrip, Severity, ValidationIssue,
};
pub use planner::{
    find_optimal_dates, latest_valid_start_date, max_consecutive_days_from, DateSuggestion,
    RiskLevel,
};
pub use trip::{with_exit_periods, DateRange, ExitPeriod, Trip};
pub use window::{
    days_used_in_window, trip_days_in_window, window_start, STAY_CAP_DAYS, WINDOW_DAYS,
};
