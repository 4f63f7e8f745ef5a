//! Footprint run driver.

use log::{info, warn};
use serde::Serialize;

use wfcarbon_models::power::memory::MemoryPowerModel;
use wfcarbon_models::power::profiles::ProfileLibrary;

use crate::config::RunConfig;
use crate::error::Error;
use crate::intensity::CarbonIntensity;
use crate::record::{CarbonRecord, RecordBuilder};
use crate::summary::{summarize, RunSummary};
use crate::trace::TraceRow;

/// Counters for recoverable deviations observed during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Rows rejected for shape violations (skip-and-count policy) plus lines
    /// the CSV parser could not read.
    pub skipped_rows: usize,
    /// Rows whose reported CPU usage exceeded the allocated capacity and was clamped.
    pub clamped_utilization_rows: usize,
    /// Intensity lookups outside the series bounds, clamped to a boundary sample.
    pub clamped_intensity_lookups: usize,
}

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Per-task records in input order.
    pub records: Vec<CarbonRecord>,
    /// Aggregated totals and configuration echo.
    pub summary: RunSummary,
}

/// Runs the footprint computation over the given trace rows.
///
/// Validates the configuration and resolves the power model up front (fatal
/// errors abort before any row is processed), then processes rows in order.
/// Malformed rows are skipped with a warning and counted in the summary;
/// a trace with zero valid rows fails with [`Error::EmptyTrace`].
pub fn run(
    rows: &[TraceRow],
    config: &RunConfig,
    library: &ProfileLibrary,
    intensity: &CarbonIntensity,
) -> Result<RunOutcome, Error> {
    run_with_stats(rows, config, library, intensity, RunStats::default())
}

/// Same as [`run`], but starts from existing deviation counters
/// (e.g. unparsable lines already counted by the trace reader).
pub fn run_with_stats(
    rows: &[TraceRow],
    config: &RunConfig,
    library: &ProfileLibrary,
    intensity: &CarbonIntensity,
    mut stats: RunStats,
) -> Result<RunOutcome, Error> {
    config.validate()?;
    let cpu_model = config.power_model.resolve(library)?;
    let memory_model = MemoryPowerModel::new(config.memory_coefficient);
    let builder = RecordBuilder::new(&cpu_model, &memory_model, intensity, config.pue);

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if let Err(e) = row.validate() {
            warn!("skipping row: {}", e);
            stats.skipped_rows += 1;
            continue;
        }
        records.push(builder.build(row, &mut stats));
    }
    info!(
        "processed {} tasks ({} skipped, {} clamped intensity lookups)",
        records.len(),
        stats.skipped_rows,
        stats.clamped_intensity_lookups
    );

    let summary = summarize(&records, config, intensity, &stats)?;
    Ok(RunOutcome { records, summary })
}
