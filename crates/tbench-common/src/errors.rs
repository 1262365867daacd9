//! Error types for a benchmark run.
//!
//! The variants follow the lifecycle of a run. Setup, launch and early-exit
//! failures are fatal and abort the run before any report is produced.
//! Sample read, clock and shutdown-timeout failures are recoverable: callers
//! log them and degrade (skip a sample, report cycles only, force-kill).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for benchmark operations.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Required build tooling is missing or the build failed.
    #[error("Setup failed: {reason}")]
    FatalSetup { reason: String },

    /// The executable for a supervised process could not be started.
    #[error("Launch failed: {label} - {reason}")]
    LaunchFailed { label: String, reason: String },

    /// A supervised process died before it was confirmed alive.
    #[error("Process {label} exited prematurely, check {}", log_path.display())]
    PrematureExit { label: String, log_path: PathBuf },

    /// The kernel accounting source could not be read for this poll.
    #[error("Sample read failed: pid {pid} - {reason}")]
    SampleRead { pid: u32, reason: String },

    /// The CPU clock frequency could not be determined.
    #[error("CPU clock frequency unavailable: {reason}")]
    ClockUnavailable { reason: String },

    /// A process ignored the graceful stop request for the whole timeout.
    #[error("Shutdown timeout: {label} still running after {timeout:?}")]
    ShutdownTimeout { label: String, timeout: Duration },

    /// The graceful stop request could not be delivered.
    #[error("Stop request failed: {label} - {reason}")]
    StopFailed { label: String, reason: String },

    /// A report artifact could not be written or parsed.
    #[error("Report error: {} - {reason}", path.display())]
    Report { path: PathBuf, reason: String },

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub fn fatal_setup(reason: impl Into<String>) -> Self {
        Self::FatalSetup {
            reason: reason.into(),
        }
    }

    pub fn launch_failed(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LaunchFailed {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn premature_exit(label: impl Into<String>, log_path: impl Into<PathBuf>) -> Self {
        Self::PrematureExit {
            label: label.into(),
            log_path: log_path.into(),
        }
    }

    pub fn sample_read(pid: u32, reason: impl Into<String>) -> Self {
        Self::SampleRead {
            pid,
            reason: reason.into(),
        }
    }

    pub fn clock_unavailable(reason: impl Into<String>) -> Self {
        Self::ClockUnavailable {
            reason: reason.into(),
        }
    }

    pub fn shutdown_timeout(label: impl Into<String>, timeout: Duration) -> Self {
        Self::ShutdownTimeout {
            label: label.into(),
            timeout,
        }
    }

    pub fn stop_failed(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn report(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Report {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error invalidates the whole run.
    ///
    /// Fatal errors abort before any report is written; everything else is
    /// recovered locally and the run still produces a complete report.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalSetup { .. } | Self::LaunchFailed { .. } | Self::PrematureExit { .. }
        )
    }
}

/// Result type alias for benchmark operations.
pub type BenchResult<T> = std::result::Result<T, BenchError>;
