//! Collection of the log files created by a run.
//!
//! The processes under test write `*.log` files into the project root. A
//! snapshot is taken before launch; after shutdown, every `*.log` file not
//! in the snapshot is moved into the run's logs directory.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tbench_common::BenchResult;
use tracing::{debug, info, warn};

/// The set of `*.log` files present in a directory at some instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSnapshot {
    files: BTreeSet<PathBuf>,
}

impl LogSnapshot {
    /// Record the `*.log` files currently directly under `root`.
    pub fn capture(root: &Path) -> BenchResult<Self> {
        let files = list_logs(root)?.into_iter().collect();
        Ok(Self { files })
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn list_logs(root: &Path) -> BenchResult<Vec<PathBuf>> {
    let pattern = glob::Pattern::escape(&root.to_string_lossy()) + "/*.log";
    debug!(pattern = %pattern, "Listing log files");

    let entries = glob::glob(&pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Move every `*.log` file under `root` that is absent from `before` into
/// `logs_dir`. Returns the new locations, sorted.
///
/// A file that cannot be moved is logged and left in place.
pub fn collect_new_logs(root: &Path, before: &LogSnapshot, logs_dir: &Path) -> BenchResult<Vec<PathBuf>> {
    std::fs::create_dir_all(logs_dir)?;

    let mut collected = Vec::new();
    for path in list_logs(root)? {
        if before.contains(&path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = logs_dir.join(name);
        match move_file(&path, &target) {
            Ok(()) => collected.push(target),
            Err(e) => warn!(from = %path.display(), to = %target.display(), error = %e, "Failed to collect log"),
        }
    }

    collected.sort();
    info!(count = collected.len(), dir = %logs_dir.display(), "Collected new log files");
    Ok(collected)
}

/// Rename, falling back to copy and remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "Rename failed, copying instead");
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}
