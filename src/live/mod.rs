//! Live bot telemetry boundary: per-trading-account equity and position.
//!
//! The dashboard's month-to-date view uses the feed's current equity as a
//! closing-balance proxy regardless of staleness; staleness is classified
//! here and surfaced to the caller, never acted on silently.

use crate::domain::{Decimal, TimeMs};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpTelemetryFeed;
pub use mock::MockTelemetryFeed;

/// Live account state as reported by the bot.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStatus {
    /// Total equity including unrealized P&L.
    pub current_equity: Decimal,
    /// Cash balance when reported separately.
    pub current_balance: Option<Decimal>,
    /// Open position description, if any.
    pub position: Option<String>,
    pub last_update: TimeMs,
}

/// How old the last telemetry update is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Staleness {
    Fresh,
    Delayed,
    Stale,
}

impl Staleness {
    /// Classify against the configured band edges.
    pub fn classify(now: TimeMs, last_update: TimeMs, fresh_ms: i64, delayed_ms: i64) -> Self {
        let age = now.as_ms().saturating_sub(last_update.as_ms());
        if age < fresh_ms {
            Staleness::Fresh
        } else if age < delayed_ms {
            Staleness::Delayed
        } else {
            Staleness::Stale
        }
    }
}

/// Telemetry feed for live account state.
///
/// Implementations must handle retry/backoff; a missing account yields
/// `Ok(None)`, not an error.
#[async_trait]
pub trait TelemetryFeed: Send + Sync + fmt::Debug {
    /// Fetch current state for a trading account, or None when unknown.
    async fn fetch_status(&self, account: &str) -> Result<Option<LiveStatus>, TelemetryError>;
}

/// Error type for telemetry operations.
#[derive(Debug, Clone)]
pub enum TelemetryError {
    /// Network error (connection timeout, DNS failure).
    Network(String),
    /// HTTP error (non-success status after retries).
    Http { status: u16, message: String },
    /// Malformed response payload.
    Parse(String),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Network(msg) => write!(f, "Network error: {}", msg),
            TelemetryError::Http { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            TelemetryError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for TelemetryError {}
