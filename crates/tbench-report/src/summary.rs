//! The human-readable `summary.txt`.

use crate::model::RunResult;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tbench_common::BenchResult;

/// Number of tags shown in the latency section by default.
pub const DEFAULT_TOP_LATENCY_TAGS: usize = 15;

/// Render the run summary.
///
/// Sections: measurement window and clock reference, per-process resource
/// usage, throughput (rates and `total_` counts, sorted by key), and the
/// `top_latency_tags` most frequent latency tags.
pub fn render_summary(result: &RunResult, top_latency_tags: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Measurement duration: {:.1}s (warmup {:.1}s)",
        result.measurement_secs, result.warmup_secs
    );
    match result.cpu_mhz {
        Some(mhz) if mhz > 0.0 => {
            let _ = writeln!(out, "CPU frequency reference: {mhz:.2} MHz");
        }
        _ => out.push_str("CPU frequency reference: unavailable (RDTSC metrics remain in cycles)\n"),
    }

    out.push_str("\nProcess resource usage:\n");
    out.push_str("label,role,avg_cpu_pct,max_cpu_pct,avg_rss_kb,max_rss_kb\n");
    for r in &result.resources {
        let _ = writeln!(
            out,
            "{},{},{:.2},{:.2},{:.1},{:.1}",
            r.label, r.role, r.avg_cpu_percent, r.max_cpu_percent, r.avg_rss_kb, r.max_rss_kb
        );
    }

    out.push_str("\nThroughput metrics:\n");
    let mut throughput: BTreeMap<String, f64> = BTreeMap::new();
    for counter in &result.throughput {
        let name = counter.category.name();
        throughput.insert(name.to_string(), counter.rate);
        throughput.insert(format!("total_{name}"), counter.total as f64);
    }
    for (key, value) in &throughput {
        let _ = writeln!(out, "{key}: {value:.2}");
    }

    out.push_str("\nLatency metrics (ns unless CPU MHz unavailable):\n");
    out.push_str("tag,count,avg_ns,p50_ns,p99_ns,max_ns\n");
    for m in result.top_latency(top_latency_tags) {
        let _ = writeln!(
            out,
            "{},{},{:.2},{:.2},{:.2},{:.2}",
            m.tag, m.count, m.avg_ns, m.p50_ns, m.p99_ns, m.max_ns
        );
    }

    out
}

pub fn write_summary(result: &RunResult, top_latency_tags: usize, path: &Path) -> BenchResult<()> {
    std::fs::write(path, render_summary(result, top_latency_tags))?;
    Ok(())
}
