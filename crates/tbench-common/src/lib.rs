//! # tbench-common
//!
//! Common types shared across the trading benchmark harness.
//!
//! This crate provides the foundational pieces that all other `tbench`
//! crates build upon: the error taxonomy of a benchmark run and the
//! small domain types (process roles) used by supervision and reporting.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{BenchError, BenchResult};
pub use types::ProcessRole;
