//! Handle to one supervised process.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin};
use tbench_common::ProcessRole;
use tracing::{debug, warn};

/// A launched process together with its identity and captured output log.
///
/// Handles are owned by the [`Supervisor`](crate::Supervisor) for the whole
/// run. The output log stays open until shutdown has confirmed the process
/// is gone.
#[derive(Debug)]
pub struct ProcessHandle {
    label: String,
    role: ProcessRole,
    child: Child,
    stdout_path: PathBuf,
    stdout_file: Option<File>,
}

impl ProcessHandle {
    pub(crate) fn new(
        label: String,
        role: ProcessRole,
        child: Child,
        stdout_path: PathBuf,
        stdout_file: File,
    ) -> Self {
        Self {
            label,
            role,
            child,
            stdout_path,
            stdout_file: Some(stdout_file),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Path of the captured stdout/stderr log.
    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    /// Whether the process is still running.
    ///
    /// Reaps the process if it has exited. A failed status query counts as
    /// running so that shutdown still escalates to a kill.
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(label = %self.label, %status, "Process has exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(label = %self.label, error = %e, "Failed to query process status");
                true
            }
        }
    }

    pub(crate) fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Kill the process unconditionally and reap it.
    pub(crate) fn force_kill(&mut self) {
        if let Err(e) = self.child.kill() {
            // Already exited between the check and the kill
            debug!(label = %self.label, error = %e, "Kill failed");
        }
        if let Err(e) = self.child.wait() {
            warn!(label = %self.label, error = %e, "Failed to reap killed process");
        }
    }

    /// Close the captured output log. Failures are swallowed.
    pub fn close_log(&mut self) {
        if let Some(file) = self.stdout_file.take() {
            if let Err(e) = file.sync_all() {
                debug!(label = %self.label, error = %e, "Ignoring stdout log close failure");
            }
        }
    }
}
