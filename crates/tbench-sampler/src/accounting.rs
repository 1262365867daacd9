//! Kernel process accounting sources.
//!
//! A source turns a PID into a [`CounterSnapshot`]: the process's
//! accumulated CPU ticks, the system-wide accumulated CPU ticks and the
//! resident memory. When the counters cannot be read (process gone, zombie,
//! transient read failure) the source returns [`BenchError::SampleRead`]
//! rather than a sentinel value.

#[cfg(target_os = "linux")]
use procfs::process::Process;
#[cfg(target_os = "linux")]
use procfs::{FromReadSI, KernelStats};
#[cfg(target_os = "linux")]
use std::path::PathBuf;
use std::sync::Arc;
use tbench_common::{BenchError, BenchResult};

/// Raw accounting state needed for one CPU-delta computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// User + system ticks attributed to the process.
    pub proc_ticks: u64,
    /// Sum of every bucket of the aggregate system CPU line.
    pub total_ticks: u64,
    /// Resident memory in KB.
    pub rss_kb: u64,
}

/// Capability to read process accounting counters.
pub trait AccountingSource: Send + Sync {
    /// Whether the process is still running.
    fn is_alive(&self, pid: u32) -> bool {
        tbench_process::process_exists(pid)
    }

    /// Read the current counters for `pid`.
    fn snapshot(&self, pid: u32) -> BenchResult<CounterSnapshot>;

    /// Number of logical CPUs, used to scale utilization.
    fn cpu_count(&self) -> usize;
}

/// Accounting source backed by a procfs mount.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    proc_root: PathBuf,
    page_size_bytes: u64,
    cpu_count: usize,
}

#[cfg(target_os = "linux")]
impl ProcfsSource {
    /// Source reading the live `/proc` of this host.
    pub fn new() -> Self {
        Self::with_root("/proc", procfs::page_size(), logical_cpu_count())
    }

    /// Source reading a procfs-shaped tree rooted at `proc_root`.
    pub fn with_root(proc_root: impl Into<PathBuf>, page_size_bytes: u64, cpu_count: usize) -> Self {
        Self {
            proc_root: proc_root.into(),
            page_size_bytes,
            cpu_count: cpu_count.max(1),
        }
    }

    /// `(utime + stime, rss_pages)` of `pid`. Defunct processes are unavailable.
    fn process_counters(&self, pid: u32) -> BenchResult<(u64, u64)> {
        let process = Process::new_with_root(self.proc_root.join(pid.to_string()))
            .map_err(|e| BenchError::sample_read(pid, e.to_string()))?;
        let stat = process.stat().map_err(|e| BenchError::sample_read(pid, e.to_string()))?;
        if matches!(stat.state, 'Z' | 'X' | 'x') {
            return Err(BenchError::sample_read(pid, format!("process is defunct (state {})", stat.state)));
        }
        Ok((stat.utime + stat.stime, stat.rss))
    }

    /// Sum of every bucket of the aggregate CPU line.
    fn system_ticks(&self, pid: u32) -> BenchResult<u64> {
        let stats = KernelStats::from_file(self.proc_root.join("stat"), procfs::current_system_info())
            .map_err(|e| BenchError::sample_read(pid, e.to_string()))?;
        let total = &stats.total;
        let optional = [total.iowait, total.irq, total.softirq, total.steal, total.guest, total.guest_nice];
        Ok(total.user + total.nice + total.system + total.idle + optional.iter().flatten().sum::<u64>())
    }
}

#[cfg(target_os = "linux")]
impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl AccountingSource for ProcfsSource {
    fn snapshot(&self, pid: u32) -> BenchResult<CounterSnapshot> {
        let (proc_ticks, rss_pages) = self.process_counters(pid)?;
        let total_ticks = self.system_ticks(pid)?;

        Ok(CounterSnapshot {
            proc_ticks,
            total_ticks,
            rss_kb: rss_pages * self.page_size_bytes / 1024,
        })
    }

    fn cpu_count(&self) -> usize {
        self.cpu_count
    }
}

/// Source for platforms without a supported accounting interface.
/// Every read is unavailable, so sampling degrades to an empty series.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedSource;

impl AccountingSource for UnsupportedSource {
    fn snapshot(&self, pid: u32) -> BenchResult<CounterSnapshot> {
        Err(BenchError::sample_read(pid, "process accounting is not supported on this platform"))
    }

    fn cpu_count(&self) -> usize {
        logical_cpu_count()
    }
}

/// The accounting source for the target platform.
pub fn default_source() -> Arc<dyn AccountingSource> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(ProcfsSource::new())
    }

    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(UnsupportedSource)
    }
}

fn logical_cpu_count() -> usize {
    use sysinfo::{CpuRefreshKind, RefreshKind, System};

    let system = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
    match system.cpus().len() {
        0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        n => n,
    }
}
