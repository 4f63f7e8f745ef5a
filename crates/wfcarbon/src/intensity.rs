//! Carbon intensity providers.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One carbon intensity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensitySample {
    /// Sample timestamp in ms since epoch.
    pub timestamp: u64,
    /// Carbon intensity in gCO2e/kWh, effective from this timestamp until the next sample.
    pub value: f64,
}

/// Time-indexed carbon intensity series ordered by timestamp ascending.
///
/// The series is built once before any lookups and is read-only for the
/// duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonIntensitySeries {
    samples: Vec<IntensitySample>,
}

impl CarbonIntensitySeries {
    /// Creates a series, validating it up front.
    ///
    /// Fails with [`Error::MalformedSeries`] if the series is empty, the
    /// timestamps are not strictly increasing (duplicates would make the
    /// left-closed lookup ambiguous) or any intensity is non-positive.
    pub fn new(samples: Vec<IntensitySample>) -> Result<Self, Error> {
        if samples.is_empty() {
            return Err(Error::MalformedSeries("series is empty".to_string()));
        }
        for pair in samples.windows(2) {
            if pair[0].timestamp >= pair[1].timestamp {
                return Err(Error::MalformedSeries(format!(
                    "timestamps not strictly increasing at {}",
                    pair[1].timestamp
                )));
            }
        }
        for sample in &samples {
            if !sample.value.is_finite() || sample.value <= 0. {
                return Err(Error::MalformedSeries(format!(
                    "non-positive intensity {} at {}",
                    sample.value, sample.timestamp
                )));
            }
        }
        Ok(Self { samples })
    }

    /// Reads a series from a CSV file with `timestamp,value` columns.
    pub fn from_csv(path: &Path) -> Result<Self, Error> {
        Self::from_csv_reader(File::open(path)?)
    }

    /// Reads a series from any CSV source with `timestamp,value` columns.
    pub fn from_csv_reader<R: Read>(source: R) -> Result<Self, Error> {
        let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
        let mut samples = Vec::new();
        for result in reader.deserialize::<IntensitySample>() {
            samples.push(result?);
        }
        Self::new(samples)
    }

    /// Number of samples in the series.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the series has no samples (never after construction).
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample effective at the given timestamp.
    ///
    /// Selects the entry with the greatest timestamp not exceeding the query
    /// (each sample is effective until the next one). Queries before the first
    /// sample resolve to the first sample and are reported as clamped;
    /// likewise queries are never extrapolated past the last sample.
    pub fn lookup(&self, timestamp: u64) -> Resolution {
        let idx = self.samples.partition_point(|s| s.timestamp <= timestamp);
        if idx == 0 {
            return Resolution {
                value: self.samples[0].value,
                clamped: true,
            };
        }
        Resolution {
            value: self.samples[idx - 1].value,
            // Past the last sample the last value is reused, which is a
            // deviation worth surfacing rather than an error.
            clamped: idx == self.samples.len() && timestamp > self.samples[idx - 1].timestamp,
        }
    }
}

/// Result of a carbon intensity lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Carbon intensity in gCO2e/kWh.
    pub value: f64,
    /// Whether the query timestamp fell outside the series bounds and was
    /// clamped to a boundary sample.
    pub clamped: bool,
}

/// Carbon intensity source for a run: a fixed scalar or a time-indexed series.
#[derive(Debug, Clone, PartialEq)]
pub enum CarbonIntensity {
    /// Fixed intensity in gCO2e/kWh, independent of time.
    Constant(f64),
    /// Time-indexed series consulted by task start timestamp.
    Series(CarbonIntensitySeries),
}

impl CarbonIntensity {
    /// Creates a constant intensity source.
    ///
    /// Fails with [`Error::InvalidConfiguration`] unless the value is finite and positive.
    pub fn constant(value: f64) -> Result<Self, Error> {
        if !value.is_finite() || value <= 0. {
            return Err(Error::InvalidConfiguration(format!(
                "carbon intensity must be positive, got {}",
                value
            )));
        }
        Ok(CarbonIntensity::Constant(value))
    }

    /// Resolves the intensity in gCO2e/kWh effective at the given timestamp.
    ///
    /// Identical `(source, timestamp)` pairs always resolve identically.
    pub fn resolve(&self, timestamp: u64) -> Resolution {
        match self {
            CarbonIntensity::Constant(value) => Resolution {
                value: *value,
                clamped: false,
            },
            CarbonIntensity::Series(series) => series.lookup(timestamp),
        }
    }

    /// Returns a short human-readable descriptor used in run summaries.
    pub fn describe(&self) -> String {
        match self {
            CarbonIntensity::Constant(value) => format!("constant {} gCO2e/kWh", value),
            CarbonIntensity::Series(series) => format!("time series ({} samples)", series.len()),
        }
    }
}
