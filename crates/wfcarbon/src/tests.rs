//! Tests for the footprint engine.

use approx::assert_abs_diff_eq;

use wfcarbon_models::power::profiles::ProfileLibrary;

use crate::config::{PowerModelSpec, RunConfig};
use crate::error::Error;
use crate::intensity::{CarbonIntensity, CarbonIntensitySeries, IntensitySample};
use crate::runner::run;
use crate::trace::{read_trace_from, TraceRow};

const GB: u64 = 1 << 30;
const HOUR_MS: i64 = 3_600_000;

fn row(id: &str, start: u64, realtime: i64, cpus: u32, cpu_usage: f64, memory: u64) -> TraceRow {
    TraceRow {
        id: id.to_string(),
        name: id.to_string(),
        start,
        realtime,
        cpus,
        cpu_usage,
        memory,
    }
}

fn sample(timestamp: u64, value: f64) -> IntensitySample {
    IntensitySample { timestamp, value }
}

#[test]
fn test_constant_power_one_hour() {
    let config = RunConfig {
        power_model: PowerModelSpec::Constant { watts: 12. },
        pue: 1.0,
        memory_coefficient: 0.392,
    };
    let intensity = CarbonIntensity::constant(475.).unwrap();
    let rows = vec![row("t1", 0, HOUR_MS, 1, 100., 0)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    let record = &outcome.records[0];
    assert_abs_diff_eq!(record.energy_exc_pue, 0.012, epsilon = 1e-12);
    assert_abs_diff_eq!(record.energy_inc_pue, 0.012, epsilon = 1e-12);
    assert_abs_diff_eq!(record.memory_energy_exc_pue, 0.);
    assert_abs_diff_eq!(record.carbon_footprint, 5.7, epsilon = 1e-9);
}

#[test]
fn test_linear_power_with_pue() {
    let config = RunConfig {
        power_model: PowerModelSpec::MinMax {
            min_watts: 60.,
            max_watts: 120.,
        },
        pue: 1.67,
        memory_coefficient: 0.392,
    };
    let intensity = CarbonIntensity::constant(200.).unwrap();
    let rows = vec![row("t1", 0, HOUR_MS / 2, 1, 50., 0)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    let record = &outcome.records[0];
    assert_abs_diff_eq!(record.energy_exc_pue, 0.045, epsilon = 1e-12);
    assert_abs_diff_eq!(record.energy_inc_pue, 0.07515, epsilon = 1e-12);
    assert_abs_diff_eq!(record.carbon_footprint, 15.03, epsilon = 1e-9);
}

#[test]
fn test_memory_energy_is_additive_and_separate() {
    let config = RunConfig {
        power_model: PowerModelSpec::Constant { watts: 0. },
        pue: 2.0,
        memory_coefficient: 1.0,
    };
    let intensity = CarbonIntensity::constant(100.).unwrap();
    let rows = vec![row("t1", 0, HOUR_MS, 1, 0., GB)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    let record = &outcome.records[0];
    assert_abs_diff_eq!(record.energy_exc_pue, 0.);
    assert_abs_diff_eq!(record.memory_energy_exc_pue, 0.001, epsilon = 1e-12);
    assert_abs_diff_eq!(record.memory_energy_inc_pue, 0.002, epsilon = 1e-12);
    assert_abs_diff_eq!(record.carbon_footprint, 0.2, epsilon = 1e-9);
}

#[test]
fn test_pue_exactness_per_record() {
    let config = RunConfig {
        power_model: PowerModelSpec::MinMax {
            min_watts: 48.26,
            max_watts: 124.96333333333332,
        },
        pue: 1.3,
        memory_coefficient: 0.392,
    };
    let intensity = CarbonIntensity::constant(250.).unwrap();
    let rows = vec![
        row("a", 0, 120_000, 4, 310., 8 * GB),
        row("b", 60_000, 0, 1, 0., GB),
        row("c", 90_000, 5_400_000, 2, 145., 12 * GB),
    ];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    for record in &outcome.records {
        assert_abs_diff_eq!(record.energy_inc_pue, record.energy_exc_pue * 1.3, epsilon = 1e-15);
        assert_abs_diff_eq!(
            record.memory_energy_inc_pue,
            record.memory_energy_exc_pue * 1.3,
            epsilon = 1e-15
        );
    }
}

#[test]
fn test_totals_match_record_sums() {
    let config = RunConfig {
        power_model: PowerModelSpec::MinMax {
            min_watts: 60.,
            max_watts: 120.,
        },
        pue: 1.1,
        memory_coefficient: 0.392,
    };
    let intensity = CarbonIntensity::constant(300.).unwrap();
    let rows = vec![
        row("a", 0, 600_000, 2, 180., 4 * GB),
        row("b", 100, 1_200_000, 1, 45., 2 * GB),
        row("c", 200, 30_000, 8, 800., 16 * GB),
    ];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    let summary = &outcome.summary;
    let sum: f64 = outcome.records.iter().map(|r| r.carbon_footprint).sum();
    assert_abs_diff_eq!(summary.total_carbon_footprint, sum, epsilon = 1e-12);
    let energy_sum: f64 = outcome.records.iter().map(|r| r.energy_inc_pue).sum();
    assert_abs_diff_eq!(summary.total_energy_inc_pue, energy_sum, epsilon = 1e-12);
    let realtime_sum: u64 = outcome.records.iter().map(|r| r.realtime).sum();
    assert_eq!(summary.total_realtime, realtime_sum);
}

#[test]
fn test_zero_duration_row_still_emitted() {
    let config = RunConfig::new(PowerModelSpec::Constant { watts: 100. });
    let intensity = CarbonIntensity::constant(475.).unwrap();
    let rows = vec![row("t1", 0, 0, 1, 50., 4 * GB)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.energy_exc_pue, 0.);
    assert_eq!(record.memory_energy_exc_pue, 0.);
    assert_eq!(record.carbon_footprint, 0.);
}

#[test]
fn test_malformed_rows_skipped_and_counted() {
    let config = RunConfig::new(PowerModelSpec::Constant { watts: 10. });
    let intensity = CarbonIntensity::constant(100.).unwrap();
    let rows = vec![
        row("good", 0, 60_000, 1, 50., 0),
        row("bad-duration", 0, -1, 1, 50., 0),
        row("bad-cpus", 0, 60_000, 0, 50., 0),
    ];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].id, "good");
    assert_eq!(outcome.summary.stats.skipped_rows, 2);
}

#[test]
fn test_overcommitted_utilization_clamped() {
    let config = RunConfig::new(PowerModelSpec::MinMax {
        min_watts: 60.,
        max_watts: 120.,
    });
    let intensity = CarbonIntensity::constant(100.).unwrap();
    // 2 CPUs but 350% reported usage.
    let rows = vec![row("t1", 0, HOUR_MS, 2, 350., 0)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    // Clamped to max watts: 120 W for one hour.
    assert_abs_diff_eq!(outcome.records[0].energy_exc_pue, 0.12, epsilon = 1e-12);
    assert_eq!(outcome.summary.stats.clamped_utilization_rows, 1);
}

#[test]
fn test_empty_trace_fails() {
    let config = RunConfig::new(PowerModelSpec::Constant { watts: 10. });
    let intensity = CarbonIntensity::constant(100.).unwrap();

    let err = run(&[], &config, &ProfileLibrary::builtin(), &intensity).unwrap_err();
    assert!(matches!(err, Error::EmptyTrace));

    // All rows invalid behaves the same as zero rows.
    let rows = vec![row("bad", 0, -5, 1, 50., 0)];
    let err = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap_err();
    assert!(matches!(err, Error::EmptyTrace));
}

#[test]
fn test_invalid_configuration() {
    let intensity = CarbonIntensity::constant(100.).unwrap();
    let library = ProfileLibrary::builtin();
    let rows = vec![row("t1", 0, 1000, 1, 50., 0)];

    let mut config = RunConfig::new(PowerModelSpec::Constant { watts: 10. });
    config.pue = 0.;
    assert!(matches!(
        run(&rows, &config, &library, &intensity).unwrap_err(),
        Error::InvalidConfiguration(_)
    ));

    let mut config = RunConfig::new(PowerModelSpec::Constant { watts: 10. });
    config.memory_coefficient = -0.1;
    assert!(matches!(
        run(&rows, &config, &library, &intensity).unwrap_err(),
        Error::InvalidConfiguration(_)
    ));

    let config = RunConfig::new(PowerModelSpec::MinMax {
        min_watts: 120.,
        max_watts: 60.,
    });
    assert!(matches!(
        run(&rows, &config, &library, &intensity).unwrap_err(),
        Error::InvalidConfiguration(_)
    ));
}

#[test]
fn test_unknown_profile_fails_at_configuration_time() {
    let config = RunConfig::new(PowerModelSpec::Profile {
        name: "gpg_99_turbo_linear".to_string(),
    });
    let intensity = CarbonIntensity::constant(100.).unwrap();
    let rows = vec![row("t1", 0, 1000, 1, 50., 0)];

    let err = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap_err();
    assert!(matches!(err, Error::UnknownPowerProfile(name) if name == "gpg_99_turbo_linear"));
}

#[test]
fn test_named_profile_end_to_end() {
    let config = RunConfig::new(PowerModelSpec::Profile {
        name: "gpg_15_powersave_linear".to_string(),
    });
    let intensity = CarbonIntensity::constant(100.).unwrap();
    // 0% utilization draws the profile's min watts.
    let rows = vec![row("t1", 0, HOUR_MS, 1, 0., 0)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    assert_abs_diff_eq!(outcome.records[0].energy_exc_pue, 0.04752, epsilon = 1e-12);
}

#[test]
fn test_constant_intensity_validation() {
    assert!(CarbonIntensity::constant(475.).is_ok());
    assert!(matches!(
        CarbonIntensity::constant(0.).unwrap_err(),
        Error::InvalidConfiguration(_)
    ));
    assert!(CarbonIntensity::constant(-10.).is_err());
    assert!(CarbonIntensity::constant(f64::NAN).is_err());
}

#[test]
fn test_series_construction_validation() {
    assert!(matches!(
        CarbonIntensitySeries::new(vec![]).unwrap_err(),
        Error::MalformedSeries(_)
    ));
    assert!(matches!(
        CarbonIntensitySeries::new(vec![sample(2000, 100.), sample(1000, 200.)]).unwrap_err(),
        Error::MalformedSeries(_)
    ));
    assert!(matches!(
        CarbonIntensitySeries::new(vec![sample(1000, 100.), sample(1000, 200.)]).unwrap_err(),
        Error::MalformedSeries(_)
    ));
    assert!(matches!(
        CarbonIntensitySeries::new(vec![sample(1000, 100.), sample(2000, 0.)]).unwrap_err(),
        Error::MalformedSeries(_)
    ));
    assert!(CarbonIntensitySeries::new(vec![sample(1000, 100.), sample(2000, 200.)]).is_ok());
}

#[test]
fn test_series_lookup_left_closed() {
    let series = CarbonIntensitySeries::new(vec![
        sample(1000, 100.),
        sample(2000, 200.),
        sample(3000, 300.),
    ])
    .unwrap();

    // Exact sample timestamps select that sample.
    assert_eq!(series.lookup(1000).value, 100.);
    assert_eq!(series.lookup(2000).value, 200.);
    // Between samples the earlier one is effective.
    assert_eq!(series.lookup(1999).value, 100.);
    assert_eq!(series.lookup(2500).value, 200.);
    assert!(!series.lookup(2500).clamped);
    // Before the first sample: clamp, no extrapolation.
    let before = series.lookup(500);
    assert_eq!(before.value, 100.);
    assert!(before.clamped);
    // Past the last sample: clamp to the last value.
    let after = series.lookup(9000);
    assert_eq!(after.value, 300.);
    assert!(after.clamped);
    // The last sample's own timestamp is still within bounds.
    assert!(!series.lookup(3000).clamped);
}

#[test]
fn test_series_lookup_deterministic_and_monotone() {
    let series = CarbonIntensitySeries::new(vec![
        sample(1000, 300.),
        sample(2000, 100.),
        sample(3000, 200.),
    ])
    .unwrap();

    for ts in [1000u64, 1500, 2000, 2999, 3000] {
        assert_eq!(series.lookup(ts), series.lookup(ts));
    }
    // Resolved sample timestamps are non-decreasing in the query timestamp:
    // walking the queries forward never selects an earlier sample.
    let expected = [300., 300., 100., 100., 200.];
    for (ts, want) in [1000u64, 1500, 2000, 2999, 3000].iter().zip(expected) {
        assert_eq!(series.lookup(*ts).value, want);
    }
}

#[test]
fn test_clamped_lookups_surface_in_summary() {
    let series = CarbonIntensitySeries::new(vec![sample(10_000, 100.), sample(20_000, 200.)]).unwrap();
    let intensity = CarbonIntensity::Series(series);
    let config = RunConfig::new(PowerModelSpec::Constant { watts: 10. });
    let rows = vec![
        row("early", 5_000, 1000, 1, 50., 0),
        row("inside", 15_000, 1000, 1, 50., 0),
        row("late", 30_000, 1000, 1, 50., 0),
    ];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    assert_eq!(outcome.summary.stats.clamped_intensity_lookups, 2);
    // Early clamps to the first sample, so it matches the in-bounds row;
    // the late row sees the doubled intensity of the last sample.
    assert_abs_diff_eq!(
        outcome.records[0].carbon_footprint,
        outcome.records[1].carbon_footprint,
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        outcome.records[2].carbon_footprint,
        outcome.records[0].carbon_footprint * 2.,
        epsilon = 1e-12
    );
}

#[test]
fn test_read_trace_skips_unparsable_lines() {
    let data = "\
id,name,start,realtime,cpus,cpu_usage,memory
t1,align,1000,60000,4,350.5,2147483648
t2,sort,2000,not-a-number,2,80.0,1073741824
t3,merge,3000,30000,1,99.9,536870912
";
    let trace = read_trace_from(data.as_bytes()).unwrap();
    assert_eq!(trace.rows.len(), 2);
    assert_eq!(trace.unparsable_rows, 1);
    assert_eq!(trace.rows[0].id, "t1");
    assert_eq!(trace.rows[0].cpus, 4);
    assert_eq!(trace.rows[1].memory, 536870912);
}

#[test]
fn test_read_series_csv() {
    let data = "timestamp,value\n1000,212.5\n2000,198.0\n";
    let series = CarbonIntensitySeries::from_csv_reader(data.as_bytes()).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.lookup(1500).value, 212.5);

    let unordered = "timestamp,value\n2000,198.0\n1000,212.5\n";
    assert!(matches!(
        CarbonIntensitySeries::from_csv_reader(unordered.as_bytes()).unwrap_err(),
        Error::MalformedSeries(_)
    ));
}

#[test]
fn test_report_writers() {
    let config = RunConfig::new(PowerModelSpec::MinMax {
        min_watts: 60.,
        max_watts: 120.,
    });
    let intensity = CarbonIntensity::constant(250.).unwrap();
    let rows = vec![
        row("big", 0, 2 * HOUR_MS, 4, 390., 16 * GB),
        row("small", 0, 60_000, 1, 20., GB),
    ];
    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();

    let dir = std::env::temp_dir().join(format!("wfcarbon-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let table = dir.join("trace.csv");
    crate::report::write_task_table(&table, &outcome.records).unwrap();
    let written = std::fs::read_to_string(&table).unwrap();
    assert!(written.starts_with("id,name,realtime,energy_exc_pue"));
    assert_eq!(written.lines().count(), 3);

    let report = dir.join("report.txt");
    crate::report::write_rank_report(&report, "example", &outcome.records, 10).unwrap();
    let written = std::fs::read_to_string(&report).unwrap();
    assert!(written.contains("big:big"));

    let summary = dir.join("summary.txt");
    crate::report::write_summary(&summary, &outcome.summary).unwrap();
    assert!(std::fs::read_to_string(&summary).unwrap().contains("Carbon Footprint Trace:"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_summary_display_echoes_configuration() {
    let config = RunConfig::new(PowerModelSpec::Constant { watts: 12. });
    let intensity = CarbonIntensity::constant(475.).unwrap();
    let rows = vec![row("t1", 0, HOUR_MS, 1, 100., 0)];

    let outcome = run(&rows, &config, &ProfileLibrary::builtin(), &intensity).unwrap();
    let text = outcome.summary.to_string();
    assert!(text.contains("carbon-intensity: constant 475 gCO2e/kWh"));
    assert!(text.contains("power-model: constant 12W"));
    assert!(text.contains("Carbon Emissions:"));
    assert_abs_diff_eq!(outcome.summary.total_carbon_footprint, 5.7, epsilon = 1e-9);
}
