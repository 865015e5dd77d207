//! Forest growth model and Sobol sensitivity analysis.
//!
//! # Usage
//!
//! ```bash
//! canopy default-config > scenario.toml
//! canopy trajectory --config scenario.toml --output-dir out/
//! canopy sensitivity --config scenario.toml --samples 500 --seed 7
//! ```

use anyhow::{Context, Result};
use canopy::config::Scenario;
use canopy::pipeline::{run_baseline, run_sensitivity};
use canopy::report::{index_tables, metrics_boxplot_svg, trajectory_svg};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Forest carbon growth model with Sobol sensitivity analysis
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(about = "Simulate forest carbon growth and its parameter sensitivity")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate the baseline parameters and plot the trajectory
    Trajectory(RunArgs),
    /// Run the Sobol sensitivity sweep
    Sensitivity(SensitivityArgs),
    /// Print the reference scenario as TOML
    DefaultConfig,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Scenario file; the reference scenario is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for generated figures
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
struct SensitivityArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Override the number of base samples
    #[arg(long)]
    samples: Option<usize>,

    /// Override the number of bootstrap replicates
    #[arg(long)]
    bootstrap: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate the design on a single thread
    #[arg(long)]
    sequential: bool,
}

fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    match path {
        Some(path) => Scenario::from_file(path)
            .with_context(|| format!("Failed to load scenario from {}", path.display())),
        None => Ok(Scenario::default()),
    }
}

fn write_figure(dir: &Path, name: &str, svg: &str) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn trajectory(args: RunArgs) -> Result<()> {
    let scenario = load_scenario(args.config.as_deref())?;
    let baseline = run_baseline(&scenario)?;

    println!("max_growth     {:.4}", baseline.metrics.max_growth);
    println!("threshold_year {}", baseline.metrics.threshold_year);

    let svg = trajectory_svg(&baseline.trajectory, scenario.parameters.canopy_threshold)?;
    write_figure(&args.output_dir, "trajectory.svg", &svg)
}

fn sensitivity(args: SensitivityArgs) -> Result<()> {
    let mut scenario = load_scenario(args.run.config.as_deref())?;
    if let Some(samples) = args.samples {
        scenario.sensitivity.sample_count = samples;
    }
    if let Some(bootstrap) = args.bootstrap {
        scenario.sensitivity.bootstrap_replicates = bootstrap;
    }
    if let Some(seed) = args.seed {
        scenario.sensitivity.seed = seed;
    }
    if args.sequential {
        scenario.sensitivity.parallel = false;
    }

    let report = run_sensitivity(&scenario)?;
    for table in index_tables(&report) {
        println!("{}", table);
    }

    let svg = metrics_boxplot_svg(&report.outputs)?;
    write_figure(&args.run.output_dir, "metrics_boxplot.svg", &svg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Trajectory(args) => trajectory(args),
        Command::Sensitivity(args) => sensitivity(args),
        Command::DefaultConfig => {
            print!("{}", Scenario::default().to_toml()?);
            Ok(())
        }
    }
}
