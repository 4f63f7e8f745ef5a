//! Power consumption models.

pub mod cpu;
pub mod memory;
pub mod profiles;

#[cfg(test)]
mod tests;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: f64 = 3_600_000.;

/// Converts an average power draw in W over the given duration into energy in kWh.
pub fn energy_kwh(watts: f64, duration_ms: f64) -> f64 {
    watts * (duration_ms / MS_PER_HOUR) / 1000.
}
