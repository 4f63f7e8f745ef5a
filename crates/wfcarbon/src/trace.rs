//! Workflow execution trace model and parsing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One recorded task execution sample.
///
/// CPU usage follows the Nextflow trace convention: a percentage in
/// `0..=100 * cpus`, i.e. 250% means two and a half cores busy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    /// Task identifier.
    pub id: String,
    /// Task (process) name. Defaults to the identifier if the column is absent.
    #[serde(default)]
    pub name: String,
    /// Task start timestamp in ms since epoch.
    pub start: u64,
    /// Realtime duration in ms. Parsed signed so negative durations can be rejected.
    pub realtime: i64,
    /// Number of allocated CPUs.
    pub cpus: u32,
    /// CPU utilization percentage, 0..=100 * cpus.
    pub cpu_usage: f64,
    /// Allocated memory in bytes.
    pub memory: u64,
}

impl TraceRow {
    /// Checks basic shape constraints.
    pub fn validate(&self) -> Result<(), Error> {
        let reason = if self.realtime < 0 {
            Some(format!("negative duration {}ms", self.realtime))
        } else if self.cpus == 0 {
            Some("zero allocated CPUs".to_string())
        } else if !self.cpu_usage.is_finite() || self.cpu_usage < 0. {
            Some(format!("invalid cpu usage {}", self.cpu_usage))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(Error::MalformedTraceRow {
                task_id: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Utilization as a fraction of the allocated CPU capacity, clamped to
    /// `[0, 1]`. Returns the fraction and whether clamping was applied.
    pub fn utilization(&self) -> (f64, bool) {
        let fraction = self.cpu_usage / (100. * self.cpus as f64);
        if fraction > 1. {
            (1., true)
        } else {
            (fraction, false)
        }
    }

    /// Task display label used in reports.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.id.clone()
        } else {
            format!("{}:{}", self.name, self.id)
        }
    }
}

/// Trace rows read from a file plus the number of lines that failed to parse.
#[derive(Debug, Default)]
pub struct Trace {
    /// Successfully parsed rows, in file order.
    pub rows: Vec<TraceRow>,
    /// Number of lines rejected by the CSV parser.
    pub unparsable_rows: usize,
}

/// Reads trace rows from a CSV file with a header line.
///
/// Expected columns: `id,name,start,realtime,cpus,cpu_usage,memory`.
/// Lines that fail to parse are skipped with a warning and counted;
/// shape validation of parsed rows happens later in the run driver.
pub fn read_trace(path: &Path) -> Result<Trace, Error> {
    read_trace_from(File::open(path)?)
}

/// Reads trace rows from any CSV source with a header line.
pub fn read_trace_from<R: Read>(source: R) -> Result<Trace, Error> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let mut trace = Trace::default();
    for result in reader.deserialize::<TraceRow>() {
        match result {
            Ok(mut row) => {
                if row.name.is_empty() {
                    row.name = row.id.clone();
                }
                trace.rows.push(row);
            }
            Err(e) => {
                warn!("skipping unparsable trace line: {}", e);
                trace.unparsable_rows += 1;
            }
        }
    }
    Ok(trace)
}
