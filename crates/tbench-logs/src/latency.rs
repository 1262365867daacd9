//! Latency statistics from RDTSC events.
//!
//! Every latency event found in the collected logs contributes one cycle
//! count to its tag. Per tag the analyzer reports count, mean, p50, p99 and
//! max, in cycles and (when a reference frequency is known) nanoseconds.

use crate::grammar::LogGrammar;
use crate::scan::for_each_line;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Latency statistics for one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetric {
    pub tag: String,
    pub count: usize,
    pub avg_cycles: f64,
    pub p50_cycles: f64,
    pub p99_cycles: f64,
    pub max_cycles: f64,
    /// Nanosecond figures are 0 when no CPU frequency is known.
    pub avg_ns: f64,
    pub p50_ns: f64,
    pub p99_ns: f64,
    pub max_ns: f64,
}

/// Linear-interpolation percentile of an ascending slice.
///
/// `k = (n - 1) * pct / 100`; the result interpolates between the values at
/// `floor(k)` and `ceil(k)`. `pct` is clamped to `[0, 100]`. An empty slice
/// yields 0.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let k = (n - 1) as f64 * pct.clamp(0.0, 100.0) / 100.0;
            let lower = k.floor() as usize;
            let upper = (k.ceil() as usize).min(n - 1);
            if lower == upper {
                sorted[lower]
            } else {
                sorted[lower] + (sorted[upper] - sorted[lower]) * (k - lower as f64)
            }
        }
    }
}

/// Convert cycles to nanoseconds at `cpu_mhz`.
pub fn cycles_to_ns(cycles: f64, cpu_mhz: f64) -> f64 {
    cycles * 1000.0 / cpu_mhz
}

/// Per-tag cycle samples gathered during one analysis.
#[derive(Debug, Default)]
pub struct CycleAccumulator {
    by_tag: BTreeMap<String, Vec<u64>>,
}

impl CycleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tag: &str, cycles: u64) {
        match self.by_tag.get_mut(tag) {
            Some(values) => values.push(cycles),
            None => {
                self.by_tag.insert(tag.to_string(), vec![cycles]);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Compute the statistics, ordered by tag. A non-positive frequency is
    /// treated as unknown.
    pub fn finish(self, cpu_mhz: Option<f64>) -> Vec<LatencyMetric> {
        let cpu_mhz = cpu_mhz.filter(|mhz| *mhz > 0.0);

        self.by_tag
            .into_iter()
            .map(|(tag, mut values)| {
                values.sort_unstable();
                let count = values.len();
                let sum: u128 = values.iter().map(|v| *v as u128).sum();
                let sorted: Vec<f64> = values.iter().map(|v| *v as f64).collect();

                let avg_cycles = sum as f64 / count as f64;
                let p50_cycles = percentile(&sorted, 50.0);
                let p99_cycles = percentile(&sorted, 99.0);
                let max_cycles = sorted.last().copied().unwrap_or(0.0);
                let ns = |cycles: f64| cpu_mhz.map_or(0.0, |mhz| cycles_to_ns(cycles, mhz));

                LatencyMetric {
                    tag,
                    count,
                    avg_cycles,
                    p50_cycles,
                    p99_cycles,
                    max_cycles,
                    avg_ns: ns(avg_cycles),
                    p50_ns: ns(p50_cycles),
                    p99_ns: ns(p99_cycles),
                    max_ns: ns(max_cycles),
                }
            })
            .collect()
    }
}

/// Scan `paths` for latency events and compute per-tag statistics.
///
/// Files that cannot be read are logged and skipped. Tags with no events
/// do not appear.
pub fn analyze_latency(paths: &[PathBuf], cpu_mhz: Option<f64>) -> Vec<LatencyMetric> {
    let grammar = LogGrammar::standard();
    let mut accumulator = CycleAccumulator::new();

    for path in paths {
        let mut events = 0usize;
        let scanned = for_each_line(path, |line| {
            if let Some(event) = grammar.latency_event(line) {
                accumulator.record(event.tag, event.cycles);
                events += 1;
            }
        });
        match scanned {
            Ok(()) => debug!(path = %path.display(), events, "Scanned for latency events"),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable log"),
        }
    }

    accumulator.finish(cpu_mhz)
}
