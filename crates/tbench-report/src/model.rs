//! The result of one benchmark run.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tbench_common::{BenchError, BenchResult};
use tbench_logs::{LatencyMetric, ThroughputCounter};
use tbench_sampler::ResourceSummary;

/// Everything a run measured. Created once after analysis, then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Length of the measurement window in seconds.
    pub measurement_secs: f64,
    pub warmup_secs: f64,
    /// Reference CPU frequency, if one could be measured.
    pub cpu_mhz: Option<f64>,
    /// One entry per supervised process, in launch order.
    pub resources: Vec<ResourceSummary>,
    /// Ordered by tag.
    pub latency: Vec<LatencyMetric>,
    /// Ordered by category name.
    pub throughput: Vec<ThroughputCounter>,
}

impl RunResult {
    /// Latency entries by descending count, ties in tag order.
    pub fn top_latency(&self, limit: usize) -> Vec<&LatencyMetric> {
        let mut ranked: Vec<&LatencyMetric> = self.latency.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(limit);
        ranked
    }
}

/// Write `result` as pretty JSON.
pub fn write_run_json(result: &RunResult, path: &Path) -> BenchResult<()> {
    let json = serde_json::to_string_pretty(result).map_err(|e| BenchError::report(path, e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}
