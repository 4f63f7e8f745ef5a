//! Named power profiles for known node configurations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::power::cpu::CpuPowerModel;

/// Interpolation curve applied between the profile's minimum and maximum watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerCurve {
    /// Linear interpolation by utilization.
    #[default]
    Linear,
    /// Constant draw at the profile's minimum watts (idle/powersave baseline).
    Constant,
}

/// Power characteristics measured for one node and governor combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerProfile {
    /// The minimum power consumption in W (at 0% utilization).
    pub min_watts: f64,
    /// The maximum power consumption in W (at 100% utilization).
    pub max_watts: f64,
    /// Curve used to interpolate between the two.
    #[serde(default)]
    pub curve: PowerCurve,
}

impl PowerProfile {
    /// Builds the CPU power model described by this profile.
    pub fn to_model(&self) -> CpuPowerModel {
        match self.curve {
            PowerCurve::Linear => CpuPowerModel::Linear {
                min_watts: self.min_watts,
                max_watts: self.max_watts,
            },
            PowerCurve::Constant => CpuPowerModel::Constant { watts: self.min_watts },
        }
    }
}

/// Immutable lookup table of named power profiles.
///
/// The table is constructed once at process start and passed explicitly into
/// the engine; profile names are resolved at configuration time, never per row.
#[derive(Debug, Clone, Default)]
pub struct ProfileLibrary {
    profiles: HashMap<String, PowerProfile>,
}

impl ProfileLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with the builtin GPG cluster node profiles.
    ///
    /// Watt values come from governor-specific measurements of the GPG nodes.
    pub fn builtin() -> Self {
        let mut lib = Self::new();
        lib.insert(
            "gpg_13_ondemand_linear",
            PowerProfile {
                min_watts: 48.26,
                max_watts: 124.96333333333332,
                curve: PowerCurve::Linear,
            },
        );
        lib.insert(
            "gpg_15_powersave_linear",
            PowerProfile {
                min_watts: 47.52,
                max_watts: 106.88,
                curve: PowerCurve::Linear,
            },
        );
        lib.insert(
            "gpg_15_powersave_constant",
            PowerProfile {
                min_watts: 47.52,
                max_watts: 106.88,
                curve: PowerCurve::Constant,
            },
        );
        lib
    }

    /// Adds or replaces a profile under the given name.
    pub fn insert(&mut self, name: &str, profile: PowerProfile) {
        self.profiles.insert(name.to_string(), profile);
    }

    /// Returns the profile registered under the given name.
    pub fn get(&self, name: &str) -> Option<&PowerProfile> {
        self.profiles.get(name)
    }

    /// Returns the number of registered profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns true if the library contains no profiles.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Merges profiles parsed from a JSON object mapping names to profiles.
    ///
    /// Entries with already known names replace the builtin ones.
    pub fn merge_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let parsed: HashMap<String, PowerProfile> = serde_json::from_str(json)?;
        self.profiles.extend(parsed);
        Ok(())
    }
}
