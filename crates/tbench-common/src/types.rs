//! Core domain types shared by supervision, sampling and reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a supervised process within the trading system under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessRole {
    /// The exchange (matching engine, order server, market data publisher).
    Exchange,
    /// A trading client.
    Client,
}

impl ProcessRole {
    /// Returns the role as it appears in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessRole::Exchange => "exchange",
            ProcessRole::Client => "client",
        }
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
