//! Custom assertions for E2E tests

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tbench_process::process_exists;

/// Assert that none of `pids` is still running, allowing `grace` for the
/// kernel to reap them.
pub fn assert_all_stopped(pids: &[u32], grace: Duration) -> Result<(), String> {
    let deadline = Instant::now() + grace;
    loop {
        let alive: Vec<u32> = pids.iter().copied().filter(|pid| process_exists(*pid)).collect();
        if alive.is_empty() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(format!("Processes still running: {:?}", alive));
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Assert that `elapsed` lies within `[min, max]`.
pub fn assert_elapsed_between(elapsed: Duration, min: Duration, max: Duration) -> Result<(), String> {
    if elapsed < min || elapsed > max {
        Err(format!("Elapsed {:?} outside [{:?}, {:?}]", elapsed, min, max))
    } else {
        Ok(())
    }
}

/// Assert that a file exists and contains `pattern`.
pub fn assert_file_contains(path: &Path, pattern: &str) -> Result<(), String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    if content.contains(pattern) {
        Ok(())
    } else {
        Err(format!("{} does not contain '{}'. Content:\n{}", path.display(), pattern, content))
    }
}

/// Assert that a file has at least `min` non-empty lines.
pub fn assert_min_lines(path: &Path, min: usize) -> Result<(), String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
    if lines >= min {
        Ok(())
    } else {
        Err(format!("{} has {} lines, expected at least {}", path.display(), lines, min))
    }
}
