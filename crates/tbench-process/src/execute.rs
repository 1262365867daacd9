//! Process launching.

use crate::handle::ProcessHandle;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tbench_common::{BenchError, BenchResult, ProcessRole};
use tracing::info;

/// Where and how processes are launched.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Working directory of every launched process.
    pub working_dir: PathBuf,
    /// Directory receiving `<label>.stdout.log` files.
    pub stdout_dir: PathBuf,
    /// Keep a pipe to the child's stdin (needed by cooperative stop).
    pub pipe_stdin: bool,
}

/// Launch `command` (program first, then its arguments) as `label`.
///
/// Standard output and standard error are both captured into
/// `<stdout_dir>/<label>.stdout.log`. Arguments are passed through untouched.
pub fn launch(
    command: &[String],
    label: &str,
    role: ProcessRole,
    options: &LaunchOptions,
) -> BenchResult<ProcessHandle> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| BenchError::launch_failed(label, "empty command"))?;

    let stdout_path = options.stdout_dir.join(format!("{label}.stdout.log"));
    let stdout_file = File::create(&stdout_path)
        .map_err(|e| BenchError::launch_failed(label, format!("cannot create {}: {e}", stdout_path.display())))?;
    let stderr_file = stdout_file.try_clone()?;
    let kept_file = stdout_file.try_clone()?;

    let program = resolve_program(program, &options.working_dir);
    let stdin = if options.pipe_stdin { Stdio::piped() } else { Stdio::null() };

    let child = Command::new(&program)
        .args(args)
        .current_dir(&options.working_dir)
        .stdin(stdin)
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file))
        .spawn()
        .map_err(|e| BenchError::launch_failed(label, format!("{}: {e}", program.display())))?;

    info!(
        label,
        role = %role,
        pid = child.id(),
        program = %program.display(),
        "Launched process"
    );

    Ok(ProcessHandle::new(
        label.to_string(),
        role,
        child,
        stdout_path,
        kept_file,
    ))
}

/// Relative paths with a directory component are resolved against the
/// working directory; bare names are left for `PATH` lookup.
fn resolve_program(program: &str, working_dir: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        working_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
