//! Per-process resource sampler.
//!
//! CPU utilization is a derivative quantity: it only exists between two
//! counter snapshots. The first successful read therefore primes the
//! baseline and emits nothing; every later read emits one sample computed
//! from the delta to the retained snapshot.

use crate::accounting::{AccountingSource, CounterSnapshot};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tbench_common::{BenchResult, ProcessRole};
use tracing::{debug, trace, warn};

const RECORD_HEADER: &str = "timestamp_iso,elapsed_s,cpu_percent,rss_kb";

/// One point-in-time observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp: DateTime<Local>,
    /// Seconds since the start of the measurement window.
    pub elapsed_secs: f64,
    pub cpu_percent: f64,
    pub rss_kb: u64,
}

/// Average and maximum over every emitted sample of one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub label: String,
    pub role: ProcessRole,
    pub samples: usize,
    pub avg_cpu_percent: f64,
    pub max_cpu_percent: f64,
    pub avg_rss_kb: f64,
    pub max_rss_kb: f64,
}

/// CSV sink for emitted samples.
struct SampleRecord {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SampleRecord {
    fn create(path: &Path) -> BenchResult<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{RECORD_HEADER}")?;
        writer.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    fn append(&mut self, sample: &ResourceSample) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{},{:.3},{:.2},{}",
            sample.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            sample.elapsed_secs,
            sample.cpu_percent,
            sample.rss_kb
        )?;
        self.writer.flush()
    }
}

/// Samples CPU and RSS usage of one running process.
pub struct ResourceSampler {
    label: String,
    role: ProcessRole,
    pid: u32,
    source: Arc<dyn AccountingSource>,
    cpu_count: usize,
    previous: Option<CounterSnapshot>,
    samples: Vec<ResourceSample>,
    record: Option<SampleRecord>,
}

impl std::fmt::Debug for ResourceSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSampler")
            .field("label", &self.label)
            .field("pid", &self.pid)
            .field("primed", &self.previous.is_some())
            .field("samples", &self.samples.len())
            .field("record", &self.record.as_ref().map(|r| &r.path))
            .finish()
    }
}

impl ResourceSampler {
    pub fn new(label: impl Into<String>, role: ProcessRole, pid: u32, source: Arc<dyn AccountingSource>) -> Self {
        let cpu_count = source.cpu_count().max(1);
        Self {
            label: label.into(),
            role,
            pid,
            source,
            cpu_count,
            previous: None,
            samples: Vec::new(),
            record: None,
        }
    }

    /// Also append every emitted sample to a CSV file at `path`
    /// (created, with header).
    pub fn with_record(mut self, path: impl AsRef<Path>) -> BenchResult<Self> {
        self.record = Some(SampleRecord::create(path.as_ref())?);
        Ok(self)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn samples(&self) -> &[ResourceSample] {
        &self.samples
    }

    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }

    /// Take the baseline snapshot. Emits nothing; a failed read leaves the
    /// sampler unprimed and the next [`sample`](Self::sample) primes instead.
    pub fn prime(&mut self) {
        match self.source.snapshot(self.pid) {
            Ok(snapshot) => self.previous = Some(snapshot),
            Err(e) => debug!(label = %self.label, error = %e, "Priming read failed"),
        }
    }

    /// Take one sample. Returns the emitted sample, if any.
    ///
    /// Nothing is emitted when the process is gone, the counters are
    /// unreadable, this read only primed the baseline, or the system tick
    /// counter did not advance.
    pub fn sample(&mut self, measurement_start: Instant) -> Option<&ResourceSample> {
        if !self.source.is_alive(self.pid) {
            return None;
        }
        let current = match self.source.snapshot(self.pid) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                trace!(label = %self.label, error = %e, "Skipping sample");
                return None;
            }
        };
        let Some(previous) = self.previous else {
            self.previous = Some(current);
            return None;
        };

        let cpu_percent = cpu_percent(&previous, &current, self.cpu_count)?;
        let sample = ResourceSample {
            timestamp: Local::now(),
            elapsed_secs: measurement_start.elapsed().as_secs_f64(),
            cpu_percent,
            rss_kb: current.rss_kb,
        };

        if let Some(record) = self.record.as_mut() {
            if let Err(e) = record.append(&sample) {
                warn!(label = %self.label, path = %record.path.display(), error = %e, "Failed to append sample");
            }
        }
        self.previous = Some(current);
        self.samples.push(sample);
        self.samples.last()
    }

    /// Average and maximum CPU and RSS over all emitted samples.
    pub fn summary(&self) -> ResourceSummary {
        let count = self.samples.len();
        let (mut cpu_sum, mut cpu_max, mut rss_sum, mut rss_max) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
        for sample in &self.samples {
            let rss = sample.rss_kb as f64;
            cpu_sum += sample.cpu_percent;
            cpu_max = cpu_max.max(sample.cpu_percent);
            rss_sum += rss;
            rss_max = rss_max.max(rss);
        }
        let avg = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };

        ResourceSummary {
            label: self.label.clone(),
            role: self.role,
            samples: count,
            avg_cpu_percent: avg(cpu_sum),
            max_cpu_percent: cpu_max,
            avg_rss_kb: avg(rss_sum),
            max_rss_kb: rss_max,
        }
    }

    /// Flush the sample record.
    pub fn finish(&mut self) {
        if let Some(record) = self.record.as_mut() {
            if let Err(e) = record.writer.flush() {
                warn!(label = %self.label, error = %e, "Failed to flush sample record");
            }
        }
    }
}

/// Utilization between two snapshots, normalized so a process saturating
/// one core reports ~100% whatever the core count.
///
/// `None` when the system tick counter did not advance.
pub fn cpu_percent(previous: &CounterSnapshot, current: &CounterSnapshot, cpu_count: usize) -> Option<f64> {
    let delta_proc = current.proc_ticks as f64 - previous.proc_ticks as f64;
    let delta_total = current.total_ticks as f64 - previous.total_ticks as f64;
    if delta_total <= 0.0 {
        return None;
    }
    Some((delta_proc / delta_total) * 100.0 * cpu_count as f64)
}
