//! # tbench-report
//!
//! The immutable result of a benchmark run and the artifacts rendered from it:
//!
//! - `rdtsc_metrics.csv`: latency statistics per tag
//! - `summary.txt`: resource, throughput and top-latency sections
//! - `run_result.json`: the whole [`RunResult`]

pub mod latency_csv;
pub mod model;
pub mod summary;

pub use latency_csv::{read_latency_csv, render_latency_csv, write_latency_csv, LatencyRow, LATENCY_CSV_HEADER};
pub use model::{write_run_json, RunResult};
pub use summary::{render_summary, write_summary, DEFAULT_TOP_LATENCY_TAGS};

use std::path::{Path, PathBuf};
use tbench_common::BenchResult;
use tracing::info;

pub const LATENCY_CSV_FILE: &str = "rdtsc_metrics.csv";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const RUN_JSON_FILE: &str = "run_result.json";

/// Locations of the written report artifacts.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub latency_csv: PathBuf,
    pub summary: PathBuf,
    pub run_json: PathBuf,
}

/// Write every report artifact of `result` into `results_dir`.
pub fn write_report(result: &RunResult, results_dir: &Path, top_latency_tags: usize) -> BenchResult<ReportPaths> {
    let paths = ReportPaths {
        latency_csv: results_dir.join(LATENCY_CSV_FILE),
        summary: results_dir.join(SUMMARY_FILE),
        run_json: results_dir.join(RUN_JSON_FILE),
    };

    write_latency_csv(&result.latency, &paths.latency_csv)?;
    write_summary(result, top_latency_tags, &paths.summary)?;
    write_run_json(result, &paths.run_json)?;

    info!(dir = %results_dir.display(), tags = result.latency.len(), "Report written");
    Ok(paths)
}
