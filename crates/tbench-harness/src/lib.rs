//! # tbench-harness
//!
//! Orchestration of a benchmark run.
//!
//! This crate provides:
//! - The YAML run configuration and launch plan, with validation
//! - The external build step
//! - The run driver composing supervision, sampling, log collection,
//!   analysis and reporting

pub mod build;
pub mod config;
pub mod driver;

// Re-export main types
pub use build::{find_in_path, missing_tools, run_build, REQUIRED_TOOLS};
pub use config::{BenchConfig, BenchmarkOptions, LaunchDescriptor};
pub use driver::{default_results_dir, RunDriver, RunOutcome, RunPaths};
