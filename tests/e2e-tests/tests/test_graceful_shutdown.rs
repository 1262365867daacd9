//! Graceful shutdown of mock traders through the supervisor.
//!
//! Every process honours the stop request, so nothing is force killed and
//! the shutdown finishes well inside its timeout.

#![cfg(unix)]

use e2e_tests::assertions::{assert_all_stopped, assert_elapsed_between};
use e2e_tests::{MockTrader, TestBench};
use std::time::Duration;
use tbench_process::{CooperativeStop, GracefulStop, SignalStop, Supervisor, SupervisorOptions};

fn supervisor(bench: &TestBench, stop: Box<dyn GracefulStop>, timeout: Duration) -> Supervisor {
    let options = SupervisorOptions {
        startup_grace: Duration::from_millis(300),
        shutdown_timeout: timeout,
        poll_interval: Duration::from_millis(100),
    };
    Supervisor::new(bench.launch_options(), options, stop)
}

fn start_all(bench: &TestBench, supervisor: &mut Supervisor, traders: &[MockTrader]) -> Result<Vec<u32>, String> {
    traders
        .iter()
        .map(|trader| {
            supervisor
                .start(&bench.command(trader), &trader.label, trader.role)
                .map_err(|e| format!("Failed to start {}: {}", trader.label, e))
        })
        .collect()
}

#[test]
fn test_signal_shutdown() {
    println!("\n========================================");
    println!("TEST: Graceful Shutdown (signal)");
    println!("========================================\n");

    let bench = TestBench::new("graceful-shutdown-signal");
    let traders = [MockTrader::exchange(), MockTrader::client(1), MockTrader::client(2)];
    let mut supervisor = supervisor(&bench, Box::new(SignalStop::default()), Duration::from_secs(5));

    // Step 1: Launch
    println!("Step 1: Launching {} mock traders...", traders.len());
    let pids = match start_all(&bench, &mut supervisor, &traders) {
        Ok(pids) => pids,
        Err(e) => {
            supervisor.shutdown();
            panic!("Test failed: {}", e);
        }
    };
    assert_eq!(supervisor.running_count(), 3);
    println!("✓ All running: {:?}\n", pids);

    // Step 2: Let them write events
    println!("Step 2: Letting mock traders run for 1 second...");
    std::thread::sleep(Duration::from_secs(1));

    // Step 3: Shutdown
    println!("Step 3: Requesting graceful stop...");
    let report = supervisor.shutdown();
    println!("Shutdown report: {:?}", report);

    assert!(report.forced.is_empty(), "Nothing should be force killed: {:?}", report.forced);
    assert_eq!(report.exited.len(), 3);
    assert_elapsed_between(report.elapsed, Duration::ZERO, Duration::from_secs(4)).unwrap();
    assert_all_stopped(&pids, Duration::from_secs(1)).unwrap();
    assert_eq!(supervisor.running_count(), 0);

    // Stdout captures are closed and kept
    for trader in &traders {
        let stdout = bench.test_dir.join("stdout").join(format!("{}.stdout.log", trader.label));
        assert!(stdout.is_file(), "Missing {}", stdout.display());
    }

    bench.cleanup();
    println!("\n========================================");
    println!("✓ TEST PASSED: Graceful Shutdown (signal)");
    println!("========================================\n");
}

#[test]
fn test_cooperative_shutdown() {
    println!("\n========================================");
    println!("TEST: Graceful Shutdown (cooperative)");
    println!("========================================\n");

    let bench = TestBench::new("graceful-shutdown-cooperative");
    // SIGINT is ignored, only the stdin stop line can stop these
    let traders = [
        MockTrader::exchange().arg("--ignore-interrupt"),
        MockTrader::client(1).arg("--ignore-interrupt"),
    ];
    let mut supervisor = supervisor(&bench, Box::new(CooperativeStop::default()), Duration::from_secs(5));

    println!("Step 1: Launching with piped stdin...");
    let pids = match start_all(&bench, &mut supervisor, &traders) {
        Ok(pids) => pids,
        Err(e) => {
            supervisor.shutdown();
            panic!("Test failed: {}", e);
        }
    };
    println!("✓ All running: {:?}\n", pids);

    println!("Step 2: Writing stop lines...");
    let report = supervisor.shutdown();
    println!("Shutdown report: {:?}", report);

    assert!(report.forced.is_empty(), "Nothing should be force killed: {:?}", report.forced);
    assert_eq!(report.exited, vec!["exchange".to_string(), "client1".to_string()]);
    assert_all_stopped(&pids, Duration::from_secs(1)).unwrap();

    bench.cleanup();
    println!("\n========================================");
    println!("✓ TEST PASSED: Graceful Shutdown (cooperative)");
    println!("========================================\n");
}
