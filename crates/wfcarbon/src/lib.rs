#![warn(missing_docs)]
//! Carbon footprint estimation for scientific workflow traces.
//!
//! The engine converts per-task resource usage samples into energy (kWh) and
//! carbon (gCO2e) figures under a configurable power model and a constant or
//! time-indexed carbon intensity signal, and aggregates them into a
//! workflow-level summary.
//!
//! A run is a batch computation over values scoped to that run: the trace is
//! read into memory, rows are processed independently in order, and the
//! summary is derived from the completed record sequence.

pub mod config;
pub mod error;
pub mod intensity;
pub mod record;
pub mod report;
pub mod runner;
pub mod summary;
pub mod trace;

#[cfg(test)]
mod tests;
