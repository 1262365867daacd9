//! # tbench-logs
//!
//! Post-run log handling for the benchmark harness.
//!
//! This crate provides:
//! - The declarative grammar of the structured log lines the processes
//!   under test emit (latency events and throughput markers)
//! - A lossy, line-oriented log scanner
//! - Latency statistics per tag (count/avg/p50/p99/max, cycles and ns)
//! - Throughput counters per event category
//! - Collection of the log files a run created

pub mod collector;
pub mod grammar;
pub mod latency;
pub mod scan;
pub mod throughput;

// Re-export main types
pub use collector::{collect_new_logs, LogSnapshot};
pub use grammar::{LatencyEvent, LogGrammar, MarkerRule, MarkerScope, ThroughputCategory};
pub use latency::{analyze_latency, cycles_to_ns, percentile, CycleAccumulator, LatencyMetric};
pub use throughput::{analyze_throughput, rate, ThroughputCounter};
