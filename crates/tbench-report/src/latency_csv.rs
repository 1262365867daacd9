//! The `rdtsc_metrics.csv` latency table.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tbench_common::{BenchError, BenchResult};
use tbench_logs::LatencyMetric;

pub const LATENCY_CSV_HEADER: &str =
    "tag,count,avg_cycles,p50_cycles,p99_cycles,max_cycles,avg_ns,p50_ns,p99_ns,max_ns";

/// One parsed row of the latency table.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRow {
    pub count: usize,
    pub avg_cycles: f64,
    pub p50_cycles: f64,
    pub p99_cycles: f64,
    pub max_cycles: f64,
    pub avg_ns: f64,
    pub p50_ns: f64,
    pub p99_ns: f64,
    pub max_ns: f64,
}

/// Render the table, one row per metric in the given order, two decimals.
pub fn render_latency_csv(metrics: &[LatencyMetric]) -> String {
    let mut out = String::with_capacity(LATENCY_CSV_HEADER.len() + metrics.len() * 96);
    out.push_str(LATENCY_CSV_HEADER);
    out.push('\n');
    for m in metrics {
        let _ = writeln!(
            out,
            "{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            m.tag,
            m.count,
            m.avg_cycles,
            m.p50_cycles,
            m.p99_cycles,
            m.max_cycles,
            m.avg_ns,
            m.p50_ns,
            m.p99_ns,
            m.max_ns
        );
    }
    out
}

pub fn write_latency_csv(metrics: &[LatencyMetric], path: &Path) -> BenchResult<()> {
    std::fs::write(path, render_latency_csv(metrics))?;
    Ok(())
}

/// Parse a latency table back into a tag-keyed map.
pub fn read_latency_csv(text: &str) -> BenchResult<BTreeMap<String, LatencyRow>> {
    let parse_error = |line: usize, reason: String| BenchError::report("rdtsc_metrics.csv", format!("line {line}: {reason}"));

    let mut lines = text.lines().enumerate();
    match lines.next() {
        Some((_, header)) if header.trim() == LATENCY_CSV_HEADER => {}
        Some((_, header)) => return Err(parse_error(1, format!("unexpected header '{header}'"))),
        None => return Err(parse_error(1, "empty table".to_string())),
    }

    let mut rows = BTreeMap::new();
    for (index, line) in lines {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 10 {
            return Err(parse_error(line_no, format!("expected 10 fields, found {}", fields.len())));
        }

        let count = fields[1]
            .parse::<usize>()
            .map_err(|e| parse_error(line_no, format!("count: {e}")))?;
        let mut stats = [0.0f64; 8];
        for (slot, raw) in stats.iter_mut().zip(&fields[2..]) {
            *slot = raw
                .parse::<f64>()
                .map_err(|e| parse_error(line_no, format!("'{raw}': {e}")))?;
        }

        rows.insert(
            fields[0].to_string(),
            LatencyRow {
                count,
                avg_cycles: stats[0],
                p50_cycles: stats[1],
                p99_cycles: stats[2],
                max_cycles: stats[3],
                avg_ns: stats[4],
                p50_ns: stats[5],
                p99_ns: stats[6],
                max_ns: stats[7],
            },
        );
    }
    Ok(rows)
}
