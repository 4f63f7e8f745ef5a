//! Report writers for per-task tables and run summaries.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Error;
use crate::record::CarbonRecord;
use crate::summary::RunSummary;

/// Writes the per-task table as a CSV file, one row per carbon record.
pub fn write_task_table(path: &Path, records: &[CarbonRecord]) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the human-readable run summary.
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), Error> {
    fs::write(path, summary.to_string())?;
    Ok(())
}

fn by_footprint(a: &&CarbonRecord, b: &&CarbonRecord) -> Ordering {
    b.carbon_footprint
        .total_cmp(&a.carbon_footprint)
        .then(b.energy_inc_pue.total_cmp(&a.energy_inc_pue))
        .then(b.realtime.cmp(&a.realtime))
}

fn by_energy(a: &&CarbonRecord, b: &&CarbonRecord) -> Ordering {
    b.energy_inc_pue
        .total_cmp(&a.energy_inc_pue)
        .then(b.realtime.cmp(&a.realtime))
}

/// Writes a ranking report naming the top-N tasks by footprint and by energy.
///
/// With a time-varying carbon intensity the two orderings can differ; the
/// report calls out tasks with a top footprint but not a top energy draw.
pub fn write_rank_report(path: &Path, title: &str, records: &[CarbonRecord], top_n: usize) -> Result<(), Error> {
    let mut by_fp: Vec<&CarbonRecord> = records.iter().collect();
    by_fp.sort_by(by_footprint);
    let mut by_en: Vec<&CarbonRecord> = records.iter().collect();
    by_en.sort_by(by_energy);

    let mut out = fs::File::create(path)?;
    writeln!(out, "Detailed Report for {}", title)?;
    writeln!(out)?;
    writeln!(out, "Top {} Tasks - ranked by footprint, energy and realtime:", top_n)?;
    for record in by_fp.iter().take(top_n) {
        writeln!(out, "{}", record.label())?;
    }
    writeln!(out)?;
    writeln!(out, "Top {} Tasks - ranked by energy and realtime:", top_n)?;
    for record in by_en.iter().take(top_n) {
        writeln!(out, "{}", record.label())?;
    }
    writeln!(out)?;

    let top_energy: HashSet<String> = by_en.iter().take(top_n).map(|r| r.label()).collect();
    let diff: Vec<String> = by_fp
        .iter()
        .take(top_n)
        .map(|r| r.label())
        .filter(|label| !top_energy.contains(label))
        .collect();
    if diff.is_empty() {
        writeln!(
            out,
            "The top {} tasks with the largest energy and realtime have the largest footprint.",
            top_n
        )?;
    } else {
        writeln!(
            out,
            "The following tasks have one of the top {} largest footprints, but not the highest energy or realtime:",
            top_n
        )?;
        writeln!(out, "{}", diff.join(", "))?;
    }
    Ok(())
}
