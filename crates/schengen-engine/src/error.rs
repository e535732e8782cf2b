//! Error types for schengen-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid exit period: {0}")]
    InvalidExitPeriod(String),

    #[error("Unknown trip: {0}")]
    UnknownTrip(String),

    #[error("Date arithmetic overflow: {0}")]
    DateArithmetic(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
