//! CPU clock frequency probing.
//!
//! Cycle counts in the structured logs only convert to time units with a
//! reference frequency. `/proc/cpuinfo` is read first; when it has no
//! usable `cpu MHz` field the `sysinfo` view of the CPUs is used instead.

use tbench_common::{BenchError, BenchResult};
#[cfg(target_os = "linux")]
use tracing::debug;

/// Measured CPU clock frequency in MHz.
pub fn read_cpu_mhz() -> BenchResult<f64> {
    #[cfg(target_os = "linux")]
    {
        use procfs::{Current, CpuInfo};

        match CpuInfo::current() {
            Ok(info) => {
                if let Some(mhz) = cpuinfo_mhz(&info) {
                    return Ok(mhz);
                }
                debug!("No usable 'cpu MHz' field in /proc/cpuinfo");
            }
            Err(e) => debug!(error = %e, "Cannot read /proc/cpuinfo"),
        }
    }

    sysinfo_cpu_mhz().ok_or_else(|| BenchError::clock_unavailable("neither /proc/cpuinfo nor sysinfo report a CPU frequency"))
}

/// First parseable, positive `cpu MHz` value of a cpuinfo listing.
#[cfg(target_os = "linux")]
pub fn parse_cpuinfo_mhz(content: &str) -> Option<f64> {
    use procfs::{CpuInfo, FromRead};

    CpuInfo::from_read(content.as_bytes())
        .ok()
        .and_then(|info| cpuinfo_mhz(&info))
}

#[cfg(target_os = "linux")]
fn cpuinfo_mhz(info: &procfs::CpuInfo) -> Option<f64> {
    (0..info.num_cores())
        .filter_map(|cpu| info.get_field(cpu, "cpu MHz"))
        .filter_map(|value| value.trim().parse::<f64>().ok())
        .find(|mhz| *mhz > 0.0)
}

fn sysinfo_cpu_mhz() -> Option<f64> {
    use sysinfo::{CpuRefreshKind, RefreshKind, System};

    let system = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new().with_frequency()));
    system
        .cpus()
        .iter()
        .map(|cpu| cpu.frequency())
        .find(|mhz| *mhz > 0)
        .map(|mhz| mhz as f64)
}
