//! In-memory telemetry feed for tests.

use super::{LiveStatus, TelemetryError, TelemetryFeed};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock feed returning preloaded statuses by account id.
#[derive(Debug, Default)]
pub struct MockTelemetryFeed {
    statuses: HashMap<String, LiveStatus>,
    fail: bool,
}

impl MockTelemetryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: preload a status for an account.
    pub fn with_status(mut self, account: &str, status: LiveStatus) -> Self {
        self.statuses.insert(account.to_string(), status);
        self
    }

    /// Builder: make every fetch fail with a network error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl TelemetryFeed for MockTelemetryFeed {
    async fn fetch_status(&self, account: &str) -> Result<Option<LiveStatus>, TelemetryError> {
        if self.fail {
            return Err(TelemetryError::Network("mock failure".to_string()));
        }
        Ok(self.statuses.get(account).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TimeMs};

    #[tokio::test]
    async fn test_mock_returns_preloaded_status() {
        let status = LiveStatus {
            current_equity: Decimal::from_int(5000),
            current_balance: None,
            position: None,
            last_update: TimeMs::new(1000),
        };
        let feed = MockTelemetryFeed::new().with_status("acct-1", status.clone());

        assert_eq!(feed.fetch_status("acct-1").await.unwrap(), Some(status));
        assert_eq!(feed.fetch_status("acct-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let feed = MockTelemetryFeed::new().failing();
        assert!(feed.fetch_status("acct-1").await.is_err());
    }
}
