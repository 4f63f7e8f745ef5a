use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use wfcarbon::config::{PowerModelSpec, RunConfig};
use wfcarbon::error::Error;
use wfcarbon::intensity::{CarbonIntensity, CarbonIntensitySeries};
use wfcarbon::report::{write_rank_report, write_summary, write_task_table};
use wfcarbon::runner::{run_with_stats, RunStats};
use wfcarbon::trace::read_trace;
use wfcarbon_models::power::memory::DEFAULT_MEMORY_COEFFICIENT;
use wfcarbon_models::power::profiles::ProfileLibrary;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Estimates the energy consumption and carbon footprint of a workflow trace
struct Args {
    /// Path to CSV trace file (columns: id,name,start,realtime,cpus,cpu_usage,memory)
    #[arg(short, long)]
    trace: PathBuf,

    /// Carbon intensity: a numeric gCO2e/kWh value or a path to a CSV series file
    #[arg(short, long)]
    ci: String,

    /// Named power profile (e.g. gpg_15_powersave_linear)
    #[arg(short, long, conflicts_with_all = ["min_watts", "max_watts", "constant_watts"])]
    model: Option<String>,

    /// Minimum power draw in W for the linear model
    #[arg(long, requires = "max_watts")]
    min_watts: Option<f64>,

    /// Maximum power draw in W for the linear model
    #[arg(long, requires = "min_watts")]
    max_watts: Option<f64>,

    /// Constant power draw in W regardless of utilization
    #[arg(long, conflicts_with_all = ["min_watts", "max_watts"])]
    constant_watts: Option<f64>,

    /// Power usage effectiveness of the facility
    #[arg(long, default_value_t = 1.0)]
    pue: f64,

    /// Memory power draw in W per GB
    #[arg(long, default_value_t = DEFAULT_MEMORY_COEFFICIENT)]
    memory_coefficient: f64,

    /// Optional JSON file with additional power profiles
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Directory for produced reports
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Number of tasks listed in the ranking report
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn power_model_spec(args: &Args) -> Result<PowerModelSpec, Error> {
    if let Some(name) = &args.model {
        Ok(PowerModelSpec::Profile { name: name.clone() })
    } else if let Some(watts) = args.constant_watts {
        Ok(PowerModelSpec::Constant { watts })
    } else if let (Some(min_watts), Some(max_watts)) = (args.min_watts, args.max_watts) {
        Ok(PowerModelSpec::MinMax { min_watts, max_watts })
    } else {
        Err(Error::InvalidConfiguration(
            "select a power model: --model, --constant-watts or --min-watts/--max-watts".to_string(),
        ))
    }
}

fn carbon_intensity(arg: &str) -> Result<CarbonIntensity, Error> {
    match arg.parse::<f64>() {
        Ok(value) => CarbonIntensity::constant(value),
        Err(_) => Ok(CarbonIntensity::Series(CarbonIntensitySeries::from_csv(
            &PathBuf::from(arg),
        )?)),
    }
}

fn profile_library(args: &Args) -> Result<ProfileLibrary, Error> {
    let mut library = ProfileLibrary::builtin();
    if let Some(path) = &args.profiles {
        let json = fs::read_to_string(path)?;
        library
            .merge_json(&json)
            .map_err(|e| Error::InvalidConfiguration(format!("bad profile file: {}", e)))?;
    }
    Ok(library)
}

fn execute(args: &Args) -> Result<(), Error> {
    let config = RunConfig {
        power_model: power_model_spec(args)?,
        pue: args.pue,
        memory_coefficient: args.memory_coefficient,
    };
    let library = profile_library(args)?;
    let intensity = carbon_intensity(&args.ci)?;

    let trace = read_trace(&args.trace)?;
    let stats = RunStats {
        skipped_rows: trace.unparsable_rows,
        ..RunStats::default()
    };
    let outcome = run_with_stats(&trace.rows, &config, &library, &intensity, stats)?;

    fs::create_dir_all(&args.output_dir)?;
    let stem = args
        .trace
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trace".to_string());
    write_task_table(&args.output_dir.join(format!("{}-trace.csv", stem)), &outcome.records)?;
    write_summary(&args.output_dir.join(format!("{}-summary.txt", stem)), &outcome.summary)?;
    write_rank_report(
        &args.output_dir.join(format!("{}-report.txt", stem)),
        &stem,
        &outcome.records,
        args.top,
    )?;

    info!("reports written to {}", args.output_dir.display());
    println!("Carbon Emissions: {}gCO2e", outcome.summary.total_carbon_footprint);
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = execute(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
