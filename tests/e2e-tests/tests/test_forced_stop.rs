//! Forced stop after the graceful timeout.
//!
//! The mock traders ignore SIGINT, so every one of them outlives the
//! timeout and gets killed.

#![cfg(unix)]

use e2e_tests::assertions::{assert_all_stopped, assert_elapsed_between};
use e2e_tests::{MockTrader, TestBench};
use std::time::{Duration, Instant};
use tbench_process::{SignalStop, Supervisor, SupervisorOptions};

#[test]
fn test_forced_stop_after_timeout() {
    println!("\n========================================");
    println!("TEST: Forced Stop");
    println!("========================================\n");

    let bench = TestBench::new("forced-stop");
    let timeout = Duration::from_secs(1);
    let options = SupervisorOptions {
        startup_grace: Duration::from_millis(300),
        shutdown_timeout: timeout,
        poll_interval: Duration::from_millis(100),
    };
    let mut supervisor = Supervisor::new(bench.launch_options(), options, Box::new(SignalStop::default()));

    println!("Step 1: Launching mock traders that ignore SIGINT...");
    let mut pids = Vec::new();
    for trader in [MockTrader::exchange(), MockTrader::client(1), MockTrader::client(2)] {
        let trader = trader.arg("--ignore-interrupt");
        match supervisor.start(&bench.command(&trader), &trader.label, trader.role) {
            Ok(pid) => pids.push(pid),
            Err(e) => {
                supervisor.shutdown();
                panic!("Failed to start {}: {}", trader.label, e);
            }
        }
    }
    println!("✓ All running: {:?}\n", pids);

    println!("Step 2: Shutting down with a {:?} timeout...", timeout);
    let started = Instant::now();
    let report = supervisor.shutdown();
    let elapsed = started.elapsed();
    println!("Shutdown report: {:?}", report);

    assert_eq!(report.forced.len(), 3, "Every process should be force killed");
    assert!(report.exited.is_empty());
    // Bounded by the timeout plus kill and reap overhead
    assert_elapsed_between(elapsed, timeout, timeout + Duration::from_secs(3)).unwrap();
    assert_all_stopped(&pids, Duration::from_secs(2)).unwrap();

    bench.cleanup();
    println!("\n========================================");
    println!("✓ TEST PASSED: Forced Stop");
    println!("========================================\n");
}
