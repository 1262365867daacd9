//! External build step.
//!
//! The binaries under test are built by a project script. Before running
//! it, the required build tools must be resolvable on `PATH`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tbench_common::{BenchError, BenchResult};
use tracing::{debug, info};

/// Tools the build script needs.
pub const REQUIRED_TOOLS: [&str; 2] = ["cmake", "ninja"];

/// Locate an executable named `tool` on `PATH`.
pub fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in(tool, &path)
}

fn find_in(tool: &str, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file() || path.with_extension("exe").is_file()
    }
}

/// The subset of `tools` that cannot be found on `PATH`.
pub fn missing_tools<'a>(tools: &[&'a str]) -> Vec<&'a str> {
    tools.iter().copied().filter(|tool| find_in_path(tool).is_none()).collect()
}

/// Check the build tools and run `bash <script>` in `project_root`.
pub fn run_build(project_root: &Path, script: &Path) -> BenchResult<()> {
    let missing = missing_tools(&REQUIRED_TOOLS);
    if !missing.is_empty() {
        return Err(BenchError::fatal_setup(format!(
            "Missing build tools: {}. Install them (e.g. `sudo apt-get install cmake ninja-build`) \
             or use --skip-build with existing binaries",
            missing.join(", ")
        )));
    }

    info!(script = %script.display(), "Building binaries (Release + Perf)");
    let status = Command::new("bash")
        .arg(script)
        .current_dir(project_root)
        .status()
        .map_err(|e| BenchError::fatal_setup(format!("Failed to run build script {}: {e}", script.display())))?;

    if !status.success() {
        return Err(BenchError::fatal_setup(format!(
            "Build script {} failed: {status}",
            script.display()
        )));
    }

    debug!("Build finished");
    Ok(())
}
