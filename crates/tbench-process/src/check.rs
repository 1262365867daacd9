//! Process existence checking.

/// Check if a process with the given PID exists.
///
/// On Unix this uses `kill(pid, 0)`, which sends no signal but reports
/// whether the process exists. A zombie still "exists" here; callers that
/// care about zombies must look at the process state themselves.
///
/// # Returns
///
/// * `true` - Process exists (including when we lack permission to signal it)
/// * `false` - No such process, or the check itself failed
pub fn process_exists(pid: u32) -> bool {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw == 0 {
        // kill(0, ..) addresses our own process group
        return false;
    }

    match kill(Pid::from_raw(raw), None) {
        Ok(_) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(nix::errno::Errno::EPERM) => true, // exists, not ours
        Err(e) => {
            tracing::debug!(pid, error = %e, "Process existence check failed");
            false
        }
    }
}
