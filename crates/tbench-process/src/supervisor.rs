//! Supervision of the processes under test.
//!
//! The supervisor owns every [`ProcessHandle`] for the lifetime of a run.
//! Shutdown is a two-phase protocol: a graceful stop request to everything
//! still running, polling until all have exited or the timeout passes, then
//! an unconditional kill of whatever is left. Shutdown latency is therefore
//! bounded by `shutdown_timeout + poll_interval` however many processes
//! ignore the polite request.

use crate::execute::{launch, LaunchOptions};
use crate::handle::ProcessHandle;
use crate::terminate::{GracefulStop, StopDelivery};
use std::thread;
use std::time::{Duration, Instant};
use tbench_common::{BenchError, BenchResult, ProcessRole};
use tracing::{debug, info, warn};

/// Timing options for supervision.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// How long a freshly launched process must survive.
    pub startup_grace: Duration,
    /// How long to wait for graceful exits before killing.
    pub shutdown_timeout: Duration,
    /// Exit polling cadence during shutdown.
    pub poll_interval: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// What happened during shutdown.
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    /// Processes that exited on their own or after the stop request.
    pub exited: Vec<String>,
    /// Processes that had to be force-killed.
    pub forced: Vec<String>,
    /// Wall time spent in shutdown.
    pub elapsed: Duration,
}

/// Wait `grace_period`, then fail if the process has already terminated.
pub fn confirm_alive(handle: &mut ProcessHandle, grace_period: Duration) -> BenchResult<()> {
    thread::sleep(grace_period);
    if handle.is_running() {
        debug!(label = handle.label(), pid = handle.pid(), "Process confirmed alive");
        Ok(())
    } else {
        Err(BenchError::premature_exit(handle.label(), handle.stdout_path()))
    }
}

/// Owns the supervised processes and their shutdown.
pub struct Supervisor {
    launch_options: LaunchOptions,
    options: SupervisorOptions,
    stop: Box<dyn GracefulStop>,
    handles: Vec<ProcessHandle>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("launch_options", &self.launch_options)
            .field("options", &self.options)
            .field("stop", &self.stop.name())
            .field("handles", &self.handles.len())
            .finish()
    }
}

impl Supervisor {
    pub fn new(
        mut launch_options: LaunchOptions,
        options: SupervisorOptions,
        stop: Box<dyn GracefulStop>,
    ) -> Self {
        launch_options.pipe_stdin |= stop.needs_stdin();
        Self {
            launch_options,
            options,
            stop,
            handles: Vec::new(),
        }
    }

    /// Launch a process, confirm it survives the startup grace period and
    /// take ownership of it. Returns its PID.
    ///
    /// A process that died during the grace period is still kept so that
    /// its log gets closed by [`shutdown`](Self::shutdown).
    pub fn start(&mut self, command: &[String], label: &str, role: ProcessRole) -> BenchResult<u32> {
        let mut handle = launch(command, label, role, &self.launch_options)?;
        let pid = handle.pid();
        let confirmed = confirm_alive(&mut handle, self.options.startup_grace);
        self.handles.push(handle);
        confirmed.map(|_| pid)
    }

    /// Number of supervised processes still running.
    pub fn running_count(&mut self) -> usize {
        self.handles
            .iter_mut()
            .map(|h| h.is_running())
            .filter(|running| *running)
            .count()
    }

    /// Stop every supervised process: polite request, bounded wait, kill.
    ///
    /// Never fails. Timeouts are logged and escalated to a forced kill;
    /// stop-request and log-close failures are logged and ignored.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let started = Instant::now();
        let timeout = self.options.shutdown_timeout;

        info!(
            processes = self.handles.len(),
            method = self.stop.name(),
            timeout_ms = timeout.as_millis() as u64,
            "Requesting graceful stop"
        );

        for handle in self.handles.iter_mut() {
            if !handle.is_running() {
                continue;
            }
            match self.stop.request_stop(handle) {
                Ok(StopDelivery::Requested) => {
                    debug!(label = handle.label(), "Stop requested");
                }
                Ok(StopDelivery::AlreadyExited) => {
                    debug!(label = handle.label(), "Process exited before stop request");
                }
                Err(e) => {
                    warn!(label = handle.label(), error = %e, "Stop request failed");
                }
            }
        }

        let deadline = started + timeout;
        loop {
            if self.handles.iter_mut().all(|h| !h.is_running()) {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(self.options.poll_interval.min(deadline - now));
        }

        let mut report = ShutdownReport::default();
        for handle in self.handles.iter_mut() {
            if handle.is_running() {
                let err = BenchError::shutdown_timeout(handle.label(), timeout);
                warn!(label = handle.label(), error = %err, "Force killing");
                handle.force_kill();
                report.forced.push(handle.label().to_string());
            } else {
                report.exited.push(handle.label().to_string());
            }
        }

        for handle in self.handles.iter_mut() {
            handle.close_log();
        }

        report.elapsed = started.elapsed();
        info!(
            exited = report.exited.len(),
            forced = report.forced.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Shutdown complete"
        );
        report
    }
}
