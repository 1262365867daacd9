//! Grammar of the log lines emitted by the processes under test.
//!
//! Both analyzers read the same logs, so the line formats live here as data:
//!
//! - Latency events: `<HH:MM:SS.nnnnnnnnn> RDTSC <tag> <cycles>`, whitespace
//!   separated, found anywhere in a line (loggers may add a prefix).
//! - Throughput markers: one pattern per [`ThroughputCategory`], optionally
//!   restricted to files whose name identifies the writing role.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Literal marker preceding the tag of a latency event.
pub const LATENCY_MARKER: &str = "RDTSC";

/// One field of a structured event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Fixed-width `HH:MM:SS.nnnnnnnnn`.
    Timestamp,
    /// A literal word.
    Literal(&'static str),
    /// Identifier of `[A-Za-z0-9_]`, captured as `tag`.
    Tag,
    /// Unsigned integer, captured as `cycles`.
    Cycles,
}

impl Field {
    fn pattern(&self) -> String {
        match self {
            Field::Timestamp => r"\d{2}:\d{2}:\d{2}\.\d{9}".to_string(),
            Field::Literal(word) => regex::escape(word),
            Field::Tag => r"(?P<tag>[A-Za-z0-9_]+)".to_string(),
            Field::Cycles => r"(?P<cycles>\d+)".to_string(),
        }
    }
}

/// Field order of a latency event line.
pub const LATENCY_EVENT: &[Field] = &[
    Field::Timestamp,
    Field::Literal(LATENCY_MARKER),
    Field::Tag,
    Field::Cycles,
];

/// Event categories counted for throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThroughputCategory {
    MatchingEngineRequests,
    OrderServerResponses,
    MarketDataUpdates,
    OrderGatewaySends,
    MdConsumerReceives,
}

impl ThroughputCategory {
    pub const ALL: [ThroughputCategory; 5] = [
        ThroughputCategory::MatchingEngineRequests,
        ThroughputCategory::OrderServerResponses,
        ThroughputCategory::MarketDataUpdates,
        ThroughputCategory::OrderGatewaySends,
        ThroughputCategory::MdConsumerReceives,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ThroughputCategory::MatchingEngineRequests => "matching_engine_requests",
            ThroughputCategory::OrderServerResponses => "order_server_responses",
            ThroughputCategory::MarketDataUpdates => "market_data_updates",
            ThroughputCategory::OrderGatewaySends => "order_gateway_sends",
            ThroughputCategory::MdConsumerReceives => "md_consumer_receives",
        }
    }
}

impl fmt::Display for ThroughputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which files a marker applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerScope {
    AnyFile,
    /// Only files whose name contains this fragment.
    FileNameContains(&'static str),
}

impl MarkerScope {
    pub fn applies_to(&self, path: &Path) -> bool {
        match self {
            MarkerScope::AnyFile => true,
            MarkerScope::FileNameContains(fragment) => path
                .file_name()
                .map(|name| name.to_string_lossy().contains(fragment))
                .unwrap_or(false),
        }
    }
}

/// A throughput marker: lines matching `pattern` count towards `category`.
#[derive(Debug, Clone, Copy)]
pub struct MarkerRule {
    pub category: ThroughputCategory,
    pub pattern: &'static str,
    pub scope: MarkerScope,
}

/// Throughput markers. A line can count towards several categories.
pub const THROUGHPUT_MARKERS: &[MarkerRule] = &[
    MarkerRule {
        category: ThroughputCategory::MatchingEngineRequests,
        pattern: r"Processing .*MEClientRequest",
        scope: MarkerScope::AnyFile,
    },
    MarkerRule {
        category: ThroughputCategory::OrderServerResponses,
        pattern: r"Processing cid:",
        scope: MarkerScope::AnyFile,
    },
    MarkerRule {
        category: ThroughputCategory::MarketDataUpdates,
        pattern: r"Sending seq:",
        scope: MarkerScope::AnyFile,
    },
    MarkerRule {
        category: ThroughputCategory::OrderGatewaySends,
        pattern: r"Sending cid:",
        scope: MarkerScope::AnyFile,
    },
    MarkerRule {
        category: ThroughputCategory::MdConsumerReceives,
        pattern: r"Received socket",
        scope: MarkerScope::FileNameContains("market_data_consumer"),
    },
];

/// A matched latency event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyEvent<'a> {
    pub tag: &'a str,
    pub cycles: u64,
}

/// Compiled form of the line grammar.
#[derive(Debug)]
pub struct LogGrammar {
    latency: Regex,
    markers: Vec<(MarkerRule, Regex)>,
}

impl LogGrammar {
    /// Compile a grammar from a latency field layout and marker rules.
    pub fn compile(latency_fields: &[Field], markers: &[MarkerRule]) -> Result<Self, regex::Error> {
        let latency_pattern = latency_fields
            .iter()
            .map(Field::pattern)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let latency = Regex::new(&latency_pattern)?;
        let markers = markers
            .iter()
            .map(|rule| Regex::new(rule.pattern).map(|re| (*rule, re)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { latency, markers })
    }

    /// The built-in grammar, compiled once.
    pub fn standard() -> &'static LogGrammar {
        static GRAMMAR: OnceLock<LogGrammar> = OnceLock::new();
        GRAMMAR.get_or_init(|| {
            LogGrammar::compile(LATENCY_EVENT, THROUGHPUT_MARKERS).expect("built-in log grammar is valid")
        })
    }

    /// Extract a latency event from a line. Cycle values that overflow
    /// `u64` do not match.
    pub fn latency_event<'a>(&self, line: &'a str) -> Option<LatencyEvent<'a>> {
        let captures = self.latency.captures(line)?;
        let tag = captures.name("tag")?.as_str();
        let cycles = captures.name("cycles")?.as_str().parse::<u64>().ok()?;
        Some(LatencyEvent { tag, cycles })
    }

    /// Marker rules whose scope covers `path`.
    pub fn markers_for<'g>(&'g self, path: &Path) -> Vec<&'g (MarkerRule, Regex)> {
        self.markers
            .iter()
            .filter(|(rule, _)| rule.scope.applies_to(path))
            .collect()
    }
}
