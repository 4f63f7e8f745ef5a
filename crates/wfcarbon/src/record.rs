//! Per-task carbon records.

use log::warn;
use serde::Serialize;

use wfcarbon_models::power::cpu::CpuPowerModel;
use wfcarbon_models::power::energy_kwh;
use wfcarbon_models::power::memory::MemoryPowerModel;

use crate::intensity::CarbonIntensity;
use crate::runner::RunStats;
use crate::trace::TraceRow;

/// Computed energy and carbon result for a single trace row.
///
/// Created once per row and never mutated afterwards. All values are kept at
/// full floating point precision; rounding happens only at formatting time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonRecord {
    /// Task identifier.
    pub id: String,
    /// Task name.
    pub name: String,
    /// Realtime duration in ms.
    pub realtime: u64,
    /// Compute energy in kWh, without facility overhead.
    pub energy_exc_pue: f64,
    /// Compute energy in kWh, with the PUE factor applied.
    pub energy_inc_pue: f64,
    /// Memory energy in kWh, without facility overhead.
    pub memory_energy_exc_pue: f64,
    /// Memory energy in kWh, with the PUE factor applied.
    pub memory_energy_inc_pue: f64,
    /// Carbon footprint in gCO2e.
    pub carbon_footprint: f64,
}

/// Builds carbon records row by row.
///
/// Holds the resolved models for a run; the same builder processes every row,
/// recording deviations (clamped utilization, clamped intensity lookups) in
/// the provided [`RunStats`].
pub struct RecordBuilder<'a> {
    cpu_model: &'a CpuPowerModel,
    memory_model: &'a MemoryPowerModel,
    intensity: &'a CarbonIntensity,
    pue: f64,
}

impl<'a> RecordBuilder<'a> {
    /// Creates a record builder for the given resolved models.
    pub fn new(
        cpu_model: &'a CpuPowerModel,
        memory_model: &'a MemoryPowerModel,
        intensity: &'a CarbonIntensity,
        pue: f64,
    ) -> Self {
        Self {
            cpu_model,
            memory_model,
            intensity,
            pue,
        }
    }

    /// Computes the carbon record for one valid trace row.
    ///
    /// Zero-duration rows produce all-zero energy and carbon but are still
    /// emitted, preserving one-to-one correspondence with the input trace.
    pub fn build(&self, row: &TraceRow, stats: &mut RunStats) -> CarbonRecord {
        let (utilization, clamped) = row.utilization();
        if clamped {
            warn!(
                "task {}: cpu usage {}% exceeds {} CPUs, clamping utilization to 100%",
                row.id, row.cpu_usage, row.cpus
            );
            stats.clamped_utilization_rows += 1;
        }

        let duration_ms = row.realtime as f64;
        let energy_exc_pue = energy_kwh(self.cpu_model.power(utilization), duration_ms);
        let memory_energy_exc_pue = self.memory_model.energy_kwh(row.memory, duration_ms);
        // PUE is applied after the watt figures, so the exc./inc. outputs are
        // always exactly a PUE factor apart.
        let energy_inc_pue = energy_exc_pue * self.pue;
        let memory_energy_inc_pue = memory_energy_exc_pue * self.pue;

        let resolved = self.intensity.resolve(row.start);
        if resolved.clamped {
            stats.clamped_intensity_lookups += 1;
        }
        let carbon_footprint = (energy_inc_pue + memory_energy_inc_pue) * resolved.value;

        CarbonRecord {
            id: row.id.clone(),
            name: row.name.clone(),
            realtime: row.realtime as u64,
            energy_exc_pue,
            energy_inc_pue,
            memory_energy_exc_pue,
            memory_energy_inc_pue,
            carbon_footprint,
        }
    }
}

impl CarbonRecord {
    /// Task display label used in reports.
    pub fn label(&self) -> String {
        format!("{}:{}", self.name, self.id)
    }
}
