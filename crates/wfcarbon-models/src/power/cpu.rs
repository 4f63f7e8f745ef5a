//! CPU power models.

use serde::{Deserialize, Serialize};

/// A model for estimating the power consumption of CPU based on its utilization.
///
/// The set of model variants is small and closed, so it is expressed as an enum
/// dispatched by configuration rather than a trait hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CpuPowerModel {
    /// Constant power draw independent of utilization
    /// (models an always-on "powersave" draw).
    Constant {
        /// The power consumption in W.
        watts: f64,
    },
    /// Linear interpolation between the minimum and maximum power consumption values.
    Linear {
        /// The minimum power consumption in W (at 0% utilization).
        min_watts: f64,
        /// The maximum power consumption in W (at 100% utilization).
        max_watts: f64,
    },
}

impl CpuPowerModel {
    /// Returns CPU power consumption in W.
    ///
    /// CPU utilization should be passed as a float in 0.0-1.0 range.
    /// Out-of-range utilization is clamped, so the linear variant never
    /// produces values outside `[min_watts, max_watts]` even for malformed
    /// traces reporting more than 100% usage per core.
    pub fn power(&self, utilization: f64) -> f64 {
        match self {
            CpuPowerModel::Constant { watts } => *watts,
            CpuPowerModel::Linear { min_watts, max_watts } => {
                min_watts + (max_watts - min_watts) * utilization.clamp(0., 1.)
            }
        }
    }

    /// Checks the model parameters, returning a reason string if they are unusable.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            CpuPowerModel::Constant { watts } => {
                if !watts.is_finite() || *watts < 0. {
                    return Err(format!("constant watts must be finite and non-negative, got {}", watts));
                }
            }
            CpuPowerModel::Linear { min_watts, max_watts } => {
                if !min_watts.is_finite() || !max_watts.is_finite() {
                    return Err("min/max watts must be finite".to_string());
                }
                if *min_watts < 0. {
                    return Err(format!("min watts must be non-negative, got {}", min_watts));
                }
                if min_watts > max_watts {
                    return Err(format!(
                        "min watts must not exceed max watts, got {} > {}",
                        min_watts, max_watts
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns a short human-readable descriptor used in run summaries.
    pub fn describe(&self) -> String {
        match self {
            CpuPowerModel::Constant { watts } => format!("constant {}W", watts),
            CpuPowerModel::Linear { min_watts, max_watts } => {
                format!("linear {}W to {}W", min_watts, max_watts)
            }
        }
    }
}
