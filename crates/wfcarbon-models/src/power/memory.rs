//! Memory power model.

use serde::{Deserialize, Serialize};

use crate::power::energy_kwh;

/// Default memory power draw in W per GB of allocated memory.
pub const DEFAULT_MEMORY_COEFFICIENT: f64 = 0.392;

const BYTES_PER_GB: f64 = 1_073_741_824.;

/// A model for estimating the power draw of allocated memory.
///
/// Memory draws a fixed number of watts per GB allocated, independent of the
/// access pattern. Memory power is additive to compute power and the two
/// energy figures are tracked separately through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPowerModel {
    coefficient_w_per_gb: f64,
}

impl MemoryPowerModel {
    /// Creates a memory power model with the given coefficient in W per GB.
    pub fn new(coefficient_w_per_gb: f64) -> Self {
        Self { coefficient_w_per_gb }
    }

    /// Returns the coefficient in W per GB.
    pub fn coefficient(&self) -> f64 {
        self.coefficient_w_per_gb
    }

    /// Returns memory power consumption in W for the given allocation in bytes.
    pub fn power(&self, memory_bytes: u64) -> f64 {
        memory_bytes as f64 / BYTES_PER_GB * self.coefficient_w_per_gb
    }

    /// Returns memory energy consumption in kWh for the given allocation and duration.
    pub fn energy_kwh(&self, memory_bytes: u64, duration_ms: f64) -> f64 {
        energy_kwh(self.power(memory_bytes), duration_ms)
    }
}

impl Default for MemoryPowerModel {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_COEFFICIENT)
    }
}
