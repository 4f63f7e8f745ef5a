//! Errors produced by the footprint engine.

use std::fmt::{Display, Formatter};

/// Errors which terminate a footprint run.
///
/// All fatal conditions abort the run before any summary is written;
/// recoverable deviations (clamped lookups, skipped rows) are counted in
/// [`RunStats`](crate::runner::RunStats) instead.
#[derive(Debug)]
pub enum Error {
    /// Bad or missing run parameters (power model, PUE, memory coefficient,
    /// constant carbon intensity). Raised before any row is processed.
    InvalidConfiguration(String),
    /// Carbon intensity series is not ordered by timestamp or contains
    /// non-positive values. Raised at series construction.
    MalformedSeries(String),
    /// Named power profile is not present in the profile library.
    /// Raised at configuration time, never per row.
    UnknownPowerProfile(String),
    /// Trace row fails basic shape constraints (e.g. negative duration).
    /// Such rows are skipped and counted, not fatal.
    MalformedTraceRow {
        /// Identifier of the offending task.
        task_id: String,
        /// Why the row was rejected.
        reason: String,
    },
    /// No valid rows remained after filtering, nothing to summarize.
    EmptyTrace,
    /// Underlying I/O failure.
    Io(std::io::Error),
    /// Underlying CSV read/write failure.
    Csv(csv::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidConfiguration(reason) => write!(f, "invalid configuration: {}", reason),
            Error::MalformedSeries(reason) => write!(f, "malformed carbon intensity series: {}", reason),
            Error::UnknownPowerProfile(name) => write!(f, "unknown power profile: {}", name),
            Error::MalformedTraceRow { task_id, reason } => {
                write!(f, "malformed trace row for task {}: {}", task_id, reason)
            }
            Error::EmptyTrace => write!(f, "trace contains no valid rows"),
            Error::Io(e) => write!(f, "i/o error: {}", e),
            Error::Csv(e) => write!(f, "csv error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e)
    }
}
