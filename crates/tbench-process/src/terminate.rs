//! Graceful stop requests.
//!
//! Asking a process to stop politely is platform dependent. POSIX systems
//! deliver an interrupt signal; elsewhere the harness falls back to a
//! cooperative stop message written to the child's stdin.

use crate::handle::ProcessHandle;
use std::io::{ErrorKind, Write};
use tbench_common::{BenchError, BenchResult};

/// Outcome of a graceful stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDelivery {
    /// The request reached the process.
    Requested,
    /// The process exited before the request could be delivered.
    AlreadyExited,
}

/// Capability to ask a process to stop gracefully.
pub trait GracefulStop: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether processes must be launched with a piped stdin.
    fn needs_stdin(&self) -> bool {
        false
    }

    /// Deliver the stop request. Never waits for the process to exit.
    fn request_stop(&self, handle: &mut ProcessHandle) -> BenchResult<StopDelivery>;
}

/// Signal-based stop (SIGINT by default).
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct SignalStop {
    signal: nix::sys::signal::Signal,
}

#[cfg(unix)]
impl SignalStop {
    pub fn new(signal: nix::sys::signal::Signal) -> Self {
        Self { signal }
    }
}

#[cfg(unix)]
impl Default for SignalStop {
    fn default() -> Self {
        Self::new(nix::sys::signal::Signal::SIGINT)
    }
}

#[cfg(unix)]
impl GracefulStop for SignalStop {
    fn name(&self) -> &'static str {
        "signal"
    }

    fn request_stop(&self, handle: &mut ProcessHandle) -> BenchResult<StopDelivery> {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let raw = i32::try_from(handle.pid())
            .map_err(|_| BenchError::stop_failed(handle.label(), "pid out of range"))?;

        match kill(Pid::from_raw(raw), self.signal) {
            Ok(()) => Ok(StopDelivery::Requested),
            Err(nix::errno::Errno::ESRCH) => Ok(StopDelivery::AlreadyExited),
            Err(e) => Err(BenchError::stop_failed(handle.label(), e.to_string())),
        }
    }
}

/// Cooperative stop: writes a stop line to the child's stdin and closes it.
///
/// Processes must be launched with a piped stdin for this to work.
#[derive(Debug, Clone)]
pub struct CooperativeStop {
    message: String,
}

impl CooperativeStop {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for CooperativeStop {
    fn default() -> Self {
        Self::new("stop\n")
    }
}

impl GracefulStop for CooperativeStop {
    fn name(&self) -> &'static str {
        "cooperative"
    }

    fn needs_stdin(&self) -> bool {
        true
    }

    fn request_stop(&self, handle: &mut ProcessHandle) -> BenchResult<StopDelivery> {
        let mut stdin = handle
            .take_stdin()
            .ok_or_else(|| BenchError::stop_failed(handle.label(), "stdin is not piped"))?;

        match stdin.write_all(self.message.as_bytes()).and_then(|_| stdin.flush()) {
            Ok(()) => Ok(StopDelivery::Requested),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(StopDelivery::AlreadyExited),
            Err(e) => Err(BenchError::stop_failed(handle.label(), e.to_string())),
        }
        // stdin dropped here, the child also sees EOF
    }
}

/// The stop capability for the target platform.
pub fn default_graceful_stop() -> Box<dyn GracefulStop> {
    #[cfg(unix)]
    {
        Box::new(SignalStop::default())
    }

    #[cfg(not(unix))]
    {
        Box::new(CooperativeStop::default())
    }
}
