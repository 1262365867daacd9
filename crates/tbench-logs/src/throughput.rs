//! Throughput counters from marker lines.

use crate::grammar::{LogGrammar, ThroughputCategory};
use crate::scan::for_each_line;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Total marker count for a category and its rate over the measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputCounter {
    pub category: ThroughputCategory,
    pub total: u64,
    /// Events per second.
    pub rate: f64,
}

/// `count / duration_secs`, or 0 for a non-positive duration.
pub fn rate(count: u64, duration_secs: f64) -> f64 {
    if duration_secs > 0.0 {
        count as f64 / duration_secs
    } else {
        0.0
    }
}

/// Count marker lines in `paths`. Every category is reported, ordered by
/// name, with zero totals for categories that never matched.
pub fn analyze_throughput(paths: &[PathBuf], duration_secs: f64) -> Vec<ThroughputCounter> {
    let grammar = LogGrammar::standard();
    let mut totals: BTreeMap<ThroughputCategory, u64> =
        ThroughputCategory::ALL.iter().map(|c| (*c, 0)).collect();

    for path in paths {
        let rules = grammar.markers_for(path);
        let scanned = for_each_line(path, |line| {
            for (rule, pattern) in &rules {
                if pattern.is_match(line) {
                    *totals.entry(rule.category).or_insert(0) += 1;
                }
            }
        });
        match scanned {
            Ok(()) => debug!(path = %path.display(), rules = rules.len(), "Scanned for throughput markers"),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable log"),
        }
    }

    let mut counters: Vec<ThroughputCounter> = totals
        .into_iter()
        .map(|(category, total)| ThroughputCounter {
            category,
            total,
            rate: rate(total, duration_secs),
        })
        .collect();
    counters.sort_by_key(|c| c.category.name());
    counters
}
