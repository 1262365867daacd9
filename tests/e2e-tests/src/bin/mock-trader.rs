use chrono::Local;
use clap::{Parser, ValueEnum};
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};

/// Duty-cycle period of the CPU load thread.
const CPU_SLICE: Duration = Duration::from_millis(20);

/// Stand-in for the exchange and trading client binaries in E2E tests.
///
/// Writes the same structured log lines (RDTSC latency events, throughput
/// markers) into `*.log` files in its working directory and stops on
/// SIGINT, SIGTERM or a `stop` line on stdin.
#[derive(Parser, Debug)]
#[command(name = "mock-trader")]
#[command(about = "Mock trading process for benchmark harness testing", long_about = None)]
struct Args {
    /// Which process to imitate
    #[arg(long, value_enum, default_value = "client")]
    role: MockRole,

    /// Milliseconds between events
    #[arg(long, default_value = "20")]
    event_interval_ms: u64,

    /// Keep running after SIGINT
    #[arg(long)]
    ignore_interrupt: bool,

    /// Exit with failure this many milliseconds after startup
    #[arg(long)]
    crash_after_ms: Option<u64>,

    /// Memory in Megabytes to allocate and hold
    #[arg(long, default_value = "0")]
    memory_mb: usize,

    /// Hold one core at this utilization (0-100)
    #[arg(long, default_value = "0")]
    cpu_percent: u32,

    /// Trading engine arguments: `<client_id> <MODE> ...`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    trading_args: Vec<String>,
}

impl Args {
    /// Client id from the first trading argument, as the real client takes it.
    fn client_id(&self) -> u32 {
        self.trading_args
            .first()
            .and_then(|id| id.parse().ok())
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MockRole {
    Exchange,
    Client,
}

/// Append-only event log, flushed line by line.
struct EventLog {
    writer: LineWriter<File>,
}

impl EventLog {
    fn open(dir: &Path, name: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(format!("{name}.log")))?;
        Ok(Self {
            writer: LineWriter::new(file),
        })
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.writer, "{text}") {
            warn!("Failed to write event log: {}", e);
        }
    }

    fn rdtsc(&mut self, tag: &str, cycles: u64) {
        let ts = Local::now().format("%H:%M:%S%.9f");
        self.line(&format!("mock_trader.rs:0 {ts} RDTSC {tag} {cycles}"));
    }
}

/// The log files one mock process writes, named like the real binaries'.
struct EventLogs {
    role: MockRole,
    engine: EventLog,
    outbound: EventLog,
    inbound: EventLog,
}

impl EventLogs {
    fn open(role: MockRole, client_id: u32, dir: &Path) -> std::io::Result<Self> {
        let (engine, outbound, inbound) = match role {
            MockRole::Exchange => (
                "exchange_matching_engine".to_string(),
                "exchange_market_data_publisher".to_string(),
                "exchange_order_server".to_string(),
            ),
            MockRole::Client => (
                format!("trading_engine_{client_id}"),
                format!("trading_order_gateway_{client_id}"),
                format!("trading_market_data_consumer_{client_id}"),
            ),
        };
        Ok(Self {
            role,
            engine: EventLog::open(dir, &engine)?,
            outbound: EventLog::open(dir, &outbound)?,
            inbound: EventLog::open(dir, &inbound)?,
        })
    }

    fn emit(&mut self, seq: u64) {
        // Deterministic spread of cycle counts
        let cycles = 100 + (seq * 37) % 400;
        let ts = Local::now().format("%H:%M:%S");
        match self.role {
            MockRole::Exchange => {
                self.inbound.line(&format!("{ts} Processing cid:1 seq:{seq} MEClientRequest [type:NEW]"));
                self.inbound.rdtsc("T1_OrderServer_TCP_read", cycles);
                self.engine.line(&format!("{ts} Processing MEClientRequest [type:NEW ticker:0 seq:{seq}]"));
                self.engine.rdtsc("T3_MatchingEngine_LFQueue_read", cycles + 50);
                self.outbound.line(&format!("{ts} Sending seq:{seq} MEMarketUpdate [type:ADD]"));
                self.outbound.rdtsc("T5_MarketDataPublisher_LFQueue_read", cycles / 2);
            }
            MockRole::Client => {
                self.outbound.line(&format!("{ts} Sending cid:1 seq:{seq} MEClientRequest [type:NEW]"));
                self.outbound.rdtsc("T11_OrderGateway_LFQueue_read", cycles);
                self.inbound.line(&format!("{ts} Received socket:5 len:64"));
                self.inbound.rdtsc("T7_MarketDataConsumer_UDP_read", cycles + 10);
                self.engine.rdtsc("Trading_MarketOrderBook_addOrder", cycles * 2);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing with structured logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .init();

    let args = Args::parse();
    info!("Starting mock-trader with args: {:?}", args);

    let log_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut logs = match EventLogs::open(args.role, args.client_id(), &log_dir) {
        Ok(logs) => logs,
        Err(e) => {
            error!("Failed to open event logs in {}: {}", log_dir.display(), e);
            std::process::exit(1);
        }
    };

    // Setup shutdown handlers
    let shutdown = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        let shutdown_clone = shutdown.clone();
        let ignore_interrupt = args.ignore_interrupt;
        tokio::spawn(async move {
            setup_unix_signal_handler(shutdown_clone, ignore_interrupt).await;
        });
    }
    {
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            watch_stdin(shutdown_clone).await;
        });
    }

    // Allocate memory if requested
    let mut memory_holder: Vec<Vec<u8>> = Vec::new();
    if args.memory_mb > 0 {
        info!("Allocating {} MB of memory", args.memory_mb);
        allocate_memory(&mut memory_holder, args.memory_mb);
    }

    if args.cpu_percent > 0 {
        info!("Holding one core at {}%", args.cpu_percent);
        spawn_cpu_load(args.cpu_percent);
    }

    if let Some(crash_after) = args.crash_after_ms {
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(crash_after)).await;
            if !shutdown_clone.load(Ordering::Relaxed) {
                error!("mock-trader crashing after {}ms as requested", crash_after);
                std::process::exit(3);
            }
        });
    }

    info!("mock-trader is fully operational");

    let mut ticker = interval(Duration::from_millis(args.event_interval_ms.max(1)));
    let mut seq: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                logs.emit(seq);
                seq += 1;
            }
            _ = wait_for_shutdown(shutdown.clone()) => {
                info!("mock-trader received stop request");
                break;
            }
        }
    }

    debug!("Held {} MB", memory_holder.len());
    info!("mock-trader stopped after {} events", seq);
}

fn allocate_memory(holder: &mut Vec<Vec<u8>>, megabytes: usize) {
    for _ in 0..megabytes {
        let mut chunk = vec![0u8; 1024 * 1024]; // 1 MB
        // Touch the memory to ensure it's actually allocated
        for i in (0..chunk.len()).step_by(4096) {
            chunk[i] = 42;
        }
        holder.push(chunk);
    }
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        sleep(Duration::from_millis(50)).await;
    }
}

/// A `stop` line on stdin requests shutdown. EOF is not a request.
async fn watch_stdin(shutdown: Arc<AtomicBool>) {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim() == "stop" {
            info!("Received stop line on stdin");
            shutdown.store(true, Ordering::Relaxed);
            return;
        }
    }
}

#[cfg(unix)]
async fn setup_unix_signal_handler(shutdown: Arc<AtomicBool>, ignore_interrupt: bool) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {}", e);
            return;
        }
    };

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                break;
            }
            _ = sigint.recv() => {
                if ignore_interrupt {
                    info!("Received SIGINT, ignoring");
                    continue;
                }
                info!("Received SIGINT");
                break;
            }
        }
    }
    shutdown.store(true, Ordering::Relaxed);
}

/// Busy-spin for `percent` of every slice on a dedicated thread.
fn spawn_cpu_load(percent: u32) {
    let busy = CPU_SLICE * percent.min(100) / 100;
    let idle = CPU_SLICE - busy;
    std::thread::spawn(move || loop {
        let until = Instant::now() + busy;
        while Instant::now() < until {
            std::hint::spin_loop();
        }
        if !idle.is_zero() {
            std::thread::sleep(idle);
        }
    });
}
