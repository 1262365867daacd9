use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use tbench_harness::config::duration_serde;
use tbench_harness::{BenchConfig, RunDriver};

/// Performance benchmark harness for the trading system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Launch plan and run options (YAML). Uses the built-in plan if omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Measurement duration in seconds (after warmup)
    #[arg(long, value_name = "SECS")]
    duration: Option<f64>,

    /// Warmup time in seconds before measurements start
    #[arg(long, value_name = "SECS")]
    warmup: Option<f64>,

    /// Sampling interval in seconds for resource usage
    #[arg(long, value_name = "SECS")]
    sample_interval: Option<f64>,

    /// Directory to store benchmark artifacts
    #[arg(long, value_name = "DIR")]
    results_dir: Option<PathBuf>,

    /// Working directory of the processes under test
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Skip the CMake/ninja build step
    #[arg(long)]
    skip_build: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.debug)?;

    let mut config = match &args.config {
        Some(path) => {
            info!("Config file: {}", path.display());
            BenchConfig::load_from_file(path)?
        }
        None => BenchConfig::builtin()?,
    };
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    info!("Loaded launch plan with {} processes", config.launches.len());

    match RunDriver::new(config).run() {
        Ok(outcome) => {
            let summary = std::fs::read_to_string(&outcome.report.summary)
                .with_context(|| format!("Failed to read {}", outcome.report.summary.display()))?;
            println!("{summary}");
            info!("Results stored in {}", outcome.paths.results_dir.display());
            Ok(())
        }
        Err(e) => {
            error!("Benchmark failed: {}", e);
            Err(anyhow!("Benchmark failed: {}", e))
        }
    }
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(config: &mut BenchConfig, args: &Args) -> Result<()> {
    let options = &mut config.benchmark;

    if let Some(secs) = args.duration {
        options.measurement_duration = seconds("--duration", secs)?;
    }
    if let Some(secs) = args.warmup {
        options.warmup = seconds("--warmup", secs)?;
    }
    if let Some(secs) = args.sample_interval {
        options.sample_interval = seconds("--sample-interval", secs)?;
    }
    if let Some(dir) = &args.results_dir {
        options.results_dir = Some(dir.clone());
    }
    if let Some(root) = &args.project_root {
        options.project_root = root.clone();
    }
    if args.skip_build {
        options.skip_build = true;
    }

    Ok(())
}

fn seconds(flag: &str, secs: f64) -> Result<Duration> {
    duration_serde::from_secs(secs).map_err(|e| anyhow!("{flag}: {e}"))
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    Ok(())
}
