//! # tbench-sampler
//!
//! Resource sampling for the processes under test.
//!
//! This crate provides:
//! - A process accounting source abstraction with a procfs implementation
//! - The per-process resource sampler (delta-based CPU %, resident memory)
//! - CPU clock frequency probing for cycle to nanosecond conversion

pub mod accounting;
pub mod clock;
pub mod sampler;

// Re-export main types
pub use accounting::{default_source, AccountingSource, CounterSnapshot, UnsupportedSource};
pub use clock::read_cpu_mhz;

#[cfg(target_os = "linux")]
pub use accounting::ProcfsSource;
#[cfg(target_os = "linux")]
pub use clock::parse_cpuinfo_mhz;
pub use sampler::{ResourceSample, ResourceSampler, ResourceSummary};
