//! Run configuration.

use log::warn;
use serde::{Deserialize, Serialize};

use wfcarbon_models::power::cpu::CpuPowerModel;
use wfcarbon_models::power::memory::DEFAULT_MEMORY_COEFFICIENT;
use wfcarbon_models::power::profiles::ProfileLibrary;

use crate::error::Error;

/// Selects the CPU power model for a run. Exactly one variant is active per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PowerModelSpec {
    /// Fixed draw in W regardless of utilization.
    Constant {
        /// The power consumption in W.
        watts: f64,
    },
    /// Linear interpolation between explicit min and max watts.
    MinMax {
        /// The minimum power consumption in W.
        min_watts: f64,
        /// The maximum power consumption in W.
        max_watts: f64,
    },
    /// Named profile resolved against the profile library
    /// (e.g. `gpg_15_powersave_linear`).
    Profile {
        /// Profile name.
        name: String,
    },
}

impl PowerModelSpec {
    /// Resolves the selection into a concrete, validated CPU power model.
    ///
    /// Unknown profile names fail with [`Error::UnknownPowerProfile`] here,
    /// at configuration time, never per row.
    pub fn resolve(&self, library: &ProfileLibrary) -> Result<CpuPowerModel, Error> {
        let model = match self {
            PowerModelSpec::Constant { watts } => CpuPowerModel::Constant { watts: *watts },
            PowerModelSpec::MinMax { min_watts, max_watts } => CpuPowerModel::Linear {
                min_watts: *min_watts,
                max_watts: *max_watts,
            },
            PowerModelSpec::Profile { name } => library
                .get(name)
                .ok_or_else(|| Error::UnknownPowerProfile(name.clone()))?
                .to_model(),
        };
        model.validate().map_err(Error::InvalidConfiguration)?;
        Ok(model)
    }

    /// Returns a short human-readable descriptor used in run summaries.
    pub fn describe(&self) -> String {
        match self {
            PowerModelSpec::Constant { watts } => format!("constant {}W", watts),
            PowerModelSpec::MinMax { min_watts, max_watts } => {
                format!("linear {}W to {}W", min_watts, max_watts)
            }
            PowerModelSpec::Profile { name } => format!("profile {}", name),
        }
    }
}

/// Immutable configuration of a single footprint run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// CPU power model selection.
    pub power_model: PowerModelSpec,
    /// Power usage effectiveness of the facility, applied multiplicatively.
    pub pue: f64,
    /// Memory power draw in W per GB.
    pub memory_coefficient: f64,
}

impl RunConfig {
    /// Creates a run configuration with the default PUE (1.0) and memory coefficient.
    pub fn new(power_model: PowerModelSpec) -> Self {
        Self {
            power_model,
            pue: 1.0,
            memory_coefficient: DEFAULT_MEMORY_COEFFICIENT,
        }
    }

    /// Validates the scalar parameters.
    ///
    /// Fails fast with [`Error::InvalidConfiguration`] before any row is
    /// processed. A PUE below 1.0 is unusual but accepted with a warning.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.pue.is_finite() || self.pue <= 0. {
            return Err(Error::InvalidConfiguration(format!(
                "PUE must be finite and positive, got {}",
                self.pue
            )));
        }
        if self.pue < 1. {
            warn!("PUE {} is below 1.0, facility overhead will shrink the footprint", self.pue);
        }
        if !self.memory_coefficient.is_finite() || self.memory_coefficient < 0. {
            return Err(Error::InvalidConfiguration(format!(
                "memory coefficient must be finite and non-negative, got {}",
                self.memory_coefficient
            )));
        }
        Ok(())
    }
}
