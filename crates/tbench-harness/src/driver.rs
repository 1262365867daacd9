//! The run driver.
//!
//! A run is strictly sequential on one thread:
//!
//! 1. prepare the results directory and run the build step
//! 2. snapshot the `*.log` files already in the project root
//! 3. launch every process of the plan, confirm it alive, attach a sampler
//! 4. prime the samplers and wait out the warmup
//! 5. sample every process each interval until the measurement window ends
//! 6. shut everything down and collect the new log files
//! 7. analyze latency and throughput and write the report
//!
//! A process that fails to launch or dies during its startup grace period
//! aborts the run after the processes already launched are shut down.

use crate::build::run_build;
use crate::config::BenchConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tbench_common::BenchResult;
use tbench_logs::{analyze_latency, analyze_throughput, collect_new_logs, LogSnapshot};
use tbench_process::{default_graceful_stop, GracefulStop, LaunchOptions, ShutdownReport, Supervisor, SupervisorOptions};
use tbench_report::{write_report, ReportPaths, RunResult};
use tbench_sampler::{default_source, read_cpu_mhz, AccountingSource, ResourceSampler};
use tracing::{debug, info, warn};

/// Exit polling cadence during shutdown.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default results directory: `<project_root>/perf-results/<YYYYmmdd-HHMMSS>`.
pub fn default_results_dir(project_root: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    project_root.join("perf-results").join(timestamp.to_string())
}

/// Directory layout of one run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub results_dir: PathBuf,
    pub stdout_dir: PathBuf,
    pub samples_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl RunPaths {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        let results_dir = results_dir.into();
        Self {
            stdout_dir: results_dir.join("stdout"),
            samples_dir: results_dir.join("samples"),
            logs_dir: results_dir.join("logs"),
            results_dir,
        }
    }

    /// Create the directories needed before launch.
    pub fn create(&self) -> BenchResult<()> {
        std::fs::create_dir_all(&self.stdout_dir)?;
        std::fs::create_dir_all(&self.samples_dir)?;
        Ok(())
    }

    pub fn sample_record(&self, label: &str) -> PathBuf {
        self.samples_dir.join(format!("resource_samples_{label}.csv"))
    }
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: RunResult,
    pub paths: RunPaths,
    pub report: ReportPaths,
    pub shutdown: ShutdownReport,
    /// Log files moved into the results directory.
    pub collected_logs: Vec<PathBuf>,
}

/// Drives one benchmark run.
pub struct RunDriver {
    config: BenchConfig,
    source: Arc<dyn AccountingSource>,
    stop: Box<dyn GracefulStop>,
}

impl RunDriver {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            source: default_source(),
            stop: default_graceful_stop(),
        }
    }

    /// Replace the process accounting source.
    pub fn with_accounting_source(mut self, source: Arc<dyn AccountingSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the graceful stop mechanism.
    pub fn with_graceful_stop(mut self, stop: Box<dyn GracefulStop>) -> Self {
        self.stop = stop;
        self
    }

    /// Execute the run. Fatal errors are returned before any report exists.
    pub fn run(self) -> BenchResult<RunOutcome> {
        let RunDriver { config, source, stop } = self;
        let options = &config.benchmark;

        let project_root = absolute(&options.project_root)?;
        let results_dir = match &options.results_dir {
            Some(dir) => absolute(dir)?,
            None => default_results_dir(&project_root),
        };
        let paths = RunPaths::new(results_dir);
        paths.create()?;
        info!(results_dir = %paths.results_dir.display(), project_root = %project_root.display(), "Starting benchmark run");

        if options.skip_build {
            info!("Skipping build step");
        } else {
            run_build(&project_root, &options.build_script)?;
        }

        let existing_logs = LogSnapshot::capture(&project_root)?;
        debug!(existing = existing_logs.len(), "Snapshot of existing log files");

        let launch_options = LaunchOptions {
            working_dir: project_root.clone(),
            stdout_dir: paths.stdout_dir.clone(),
            pipe_stdin: false,
        };
        let supervisor_options = SupervisorOptions {
            startup_grace: options.startup_grace,
            shutdown_timeout: options.shutdown_timeout,
            poll_interval: SHUTDOWN_POLL_INTERVAL,
        };
        let mut supervisor = Supervisor::new(launch_options, supervisor_options, stop);

        let mut samplers = match launch_all(&config, &paths, &source, &mut supervisor) {
            Ok(samplers) => samplers,
            Err(e) => {
                warn!(error = %e, "Launch failed, stopping processes already started");
                supervisor.shutdown();
                return Err(e);
            }
        };

        info!(warmup_secs = options.warmup.as_secs_f64(), "Warming up");
        for sampler in samplers.iter_mut() {
            sampler.prime();
        }
        thread::sleep(options.warmup);

        info!(
            duration_secs = options.measurement_duration.as_secs_f64(),
            interval_ms = options.sample_interval.as_millis() as u64,
            "Collecting metrics"
        );
        measure(&mut samplers, options.measurement_duration, options.sample_interval);

        let shutdown = supervisor.shutdown();
        for sampler in samplers.iter_mut() {
            sampler.finish();
        }

        let collected_logs = match collect_new_logs(&project_root, &existing_logs, &paths.logs_dir) {
            Ok(logs) => logs,
            Err(e) => {
                warn!(error = %e, "Log collection failed, analyzing without logs");
                Vec::new()
            }
        };

        let cpu_mhz = match read_cpu_mhz() {
            Ok(mhz) => {
                debug!(cpu_mhz = mhz, "CPU frequency reference");
                Some(mhz)
            }
            Err(e) => {
                warn!(error = %e, "Latency metrics stay in cycles");
                None
            }
        };

        let measurement_secs = options.measurement_duration.as_secs_f64();
        let result = RunResult {
            measurement_secs,
            warmup_secs: options.warmup.as_secs_f64(),
            cpu_mhz,
            resources: samplers.iter().map(ResourceSampler::summary).collect(),
            latency: analyze_latency(&collected_logs, cpu_mhz),
            throughput: analyze_throughput(&collected_logs, measurement_secs),
        };

        let report = write_report(&result, &paths.results_dir, options.top_latency_tags)?;

        Ok(RunOutcome {
            result,
            paths,
            report,
            shutdown,
            collected_logs,
        })
    }
}

/// Launch the plan in order, one sampler per process.
fn launch_all(
    config: &BenchConfig,
    paths: &RunPaths,
    source: &Arc<dyn AccountingSource>,
    supervisor: &mut Supervisor,
) -> BenchResult<Vec<ResourceSampler>> {
    let mut samplers = Vec::with_capacity(config.launches.len());

    for launch in &config.launches {
        info!(label = %launch.label, role = %launch.role, "Launching");
        let pid = supervisor.start(&launch.command, &launch.label, launch.role)?;
        let sampler = ResourceSampler::new(launch.label.clone(), launch.role, pid, Arc::clone(source))
            .with_record(paths.sample_record(&launch.label))?;
        samplers.push(sampler);

        if !launch.delay.is_zero() {
            debug!(label = %launch.label, delay_ms = launch.delay.as_millis() as u64, "Inter-launch delay");
            thread::sleep(launch.delay);
        }
    }

    Ok(samplers)
}

/// Sample every process once per interval until `duration` has elapsed.
fn measure(samplers: &mut [ResourceSampler], duration: Duration, interval: Duration) {
    let measurement_start = Instant::now();
    let measurement_end = measurement_start + duration;

    loop {
        let now = Instant::now();
        if now >= measurement_end {
            break;
        }
        for sampler in samplers.iter_mut() {
            sampler.sample(measurement_start);
        }
        let remaining = measurement_end.saturating_duration_since(Instant::now());
        thread::sleep(interval.min(remaining));
    }

    let emitted: usize = samplers.iter().map(|s| s.samples().len()).sum();
    debug!(emitted, "Measurement window closed");
}

fn absolute(path: &Path) -> BenchResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
