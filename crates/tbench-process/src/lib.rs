//! # tbench-process
//!
//! Process-level primitives for the benchmark harness.
//!
//! This crate provides:
//! - Process launching with captured output
//! - Process existence checks
//! - A "request graceful stop" capability (signal or cooperative)
//! - The supervisor that confirms early survival and runs the
//!   graceful-then-forceful shutdown across every supervised process

pub mod check;
pub mod execute;
pub mod handle;
pub mod supervisor;
pub mod terminate;

// Re-export main types
pub use check::process_exists;
pub use execute::{launch, LaunchOptions};
pub use handle::ProcessHandle;
pub use supervisor::{confirm_alive, ShutdownReport, Supervisor, SupervisorOptions};
pub use terminate::{default_graceful_stop, CooperativeStop, GracefulStop, StopDelivery};

#[cfg(unix)]
pub use terminate::SignalStop;
