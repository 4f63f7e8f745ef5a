//! Workflow-level aggregation.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::config::RunConfig;
use crate::error::Error;
use crate::intensity::CarbonIntensity;
use crate::record::CarbonRecord;
use crate::runner::RunStats;

/// Aggregate totals and configuration echo for a completed run.
///
/// Every total is the exact sum of the corresponding field across the emitted
/// records, never re-derived from raw trace data, so the summary is always
/// consistent with the per-task table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Descriptor of the carbon intensity source.
    pub ci_source: String,
    /// Power usage effectiveness used for the run.
    pub pue: f64,
    /// Descriptor of the selected power model.
    pub power_model: String,
    /// Memory power draw in W per GB used for the run.
    pub memory_coefficient: f64,
    /// Total compute energy in kWh, without facility overhead.
    pub total_energy_exc_pue: f64,
    /// Total compute energy in kWh, with the PUE factor applied.
    pub total_energy_inc_pue: f64,
    /// Total memory energy in kWh, without facility overhead.
    pub total_memory_energy_exc_pue: f64,
    /// Total memory energy in kWh, with the PUE factor applied.
    pub total_memory_energy_inc_pue: f64,
    /// Total carbon footprint in gCO2e.
    pub total_carbon_footprint: f64,
    /// Total task runtime in ms.
    pub total_realtime: u64,
    /// Deviation counters observed during the run.
    pub stats: RunStats,
}

/// Sums the per-task records into a workflow-level summary.
///
/// Fails with [`Error::EmptyTrace`] if no records were produced, which
/// distinguishes "nothing to summarize" from an all-zero but present trace.
pub fn summarize(
    records: &[CarbonRecord],
    config: &RunConfig,
    intensity: &CarbonIntensity,
    stats: &RunStats,
) -> Result<RunSummary, Error> {
    if records.is_empty() {
        return Err(Error::EmptyTrace);
    }
    let mut summary = RunSummary {
        ci_source: intensity.describe(),
        pue: config.pue,
        power_model: config.power_model.describe(),
        memory_coefficient: config.memory_coefficient,
        total_energy_exc_pue: 0.,
        total_energy_inc_pue: 0.,
        total_memory_energy_exc_pue: 0.,
        total_memory_energy_inc_pue: 0.,
        total_carbon_footprint: 0.,
        total_realtime: 0,
        stats: *stats,
    };
    for record in records {
        summary.total_energy_exc_pue += record.energy_exc_pue;
        summary.total_energy_inc_pue += record.energy_inc_pue;
        summary.total_memory_energy_exc_pue += record.memory_energy_exc_pue;
        summary.total_memory_energy_inc_pue += record.memory_energy_inc_pue;
        summary.total_carbon_footprint += record.carbon_footprint;
        summary.total_realtime += record.realtime;
    }
    Ok(summary)
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Carbon Footprint Trace:")?;
        writeln!(f, "- carbon-intensity: {}", self.ci_source)?;
        writeln!(f, "- power-usage-effectiveness: {}", self.pue)?;
        writeln!(f, "- power-model: {}", self.power_model)?;
        writeln!(f, "- memory-power-draw: {}W/GB", self.memory_coefficient)?;
        writeln!(f)?;
        writeln!(f, "- Energy Consumption (exc. PUE): {}kWh", self.total_energy_exc_pue)?;
        writeln!(f, "- Energy Consumption (inc. PUE): {}kWh", self.total_energy_inc_pue)?;
        writeln!(
            f,
            "- Memory Energy Consumption (exc. PUE): {}kWh",
            self.total_memory_energy_exc_pue
        )?;
        writeln!(
            f,
            "- Memory Energy Consumption (inc. PUE): {}kWh",
            self.total_memory_energy_inc_pue
        )?;
        writeln!(f, "- Carbon Emissions: {}gCO2e", self.total_carbon_footprint)?;
        writeln!(f, "- Task Runtime: {}ms", self.total_realtime)?;
        writeln!(f)?;
        writeln!(f, "- Skipped Rows: {}", self.stats.skipped_rows)?;
        writeln!(f, "- Clamped Utilization Rows: {}", self.stats.clamped_utilization_rows)?;
        write!(
            f,
            "- Clamped Intensity Lookups: {}",
            self.stats.clamped_intensity_lookups
        )
    }
}
