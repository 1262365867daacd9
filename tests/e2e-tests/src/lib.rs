// E2E Test Framework for the trading benchmark harness

pub mod assertions;

pub use fixture::{MockTrader, TestBench};

use std::env;
use std::path::{Path, PathBuf};

/// Directory holding the workspace binaries (`target/<profile>`).
fn binaries_dir() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current exe path")
        .parent()
        .expect("Failed to get parent dir")
        .to_path_buf();

    // If we're in deps/, go up one level
    if path.ends_with("deps") {
        path.pop();
    }
    path
}

/// Get the path to the mock-trader binary
pub fn get_mock_trader_path() -> PathBuf {
    let mut path = binaries_dir();

    #[cfg(windows)]
    path.push("mock-trader.exe");

    #[cfg(not(windows))]
    path.push("mock-trader");

    if !path.exists() {
        panic!("mock-trader binary not found at: {}", path.display());
    }

    path
}

/// Create a fresh test directory
pub fn create_test_dir(test_name: &str) -> PathBuf {
    // Use target/tmp instead of system temp to avoid path issues
    let target_dir = binaries_dir()
        .parent()
        .expect("Failed to get target dir")
        .to_path_buf();

    let temp_dir = target_dir.join("tmp").join(format!("e2e-test-{}", test_name));

    if temp_dir.exists() {
        std::fs::remove_dir_all(&temp_dir).ok();
    }
    std::fs::create_dir_all(&temp_dir).expect("Failed to create test directory");
    temp_dir
}

/// Clean up test directory
pub fn cleanup_test_dir(dir: &Path) {
    if dir.exists() {
        std::fs::remove_dir_all(dir).ok();
    }
}
