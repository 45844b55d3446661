//! HTTP telemetry client for the bot status endpoint.

use super::{LiveStatus, TelemetryError, TelemetryFeed};
use crate::domain::{Decimal, TimeMs};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Telemetry feed backed by the bot's status API.
#[derive(Debug, Clone)]
pub struct HttpTelemetryFeed {
    client: Client,
    base_url: String,
}

impl HttpTelemetryFeed {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_json(&self, url: &str) -> Result<reqwest::Response, TelemetryError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(TelemetryError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(TelemetryError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                return Err(backoff::Error::permanent(TelemetryError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            Ok(response)
        })
        .await
    }
}

#[async_trait]
impl TelemetryFeed for HttpTelemetryFeed {
    async fn fetch_status(&self, account: &str) -> Result<Option<LiveStatus>, TelemetryError> {
        debug!("Fetching live status for account={}", account);

        let url = format!("{}/status/{}", self.base_url, account);
        let response = self.get_json(&url).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TelemetryError::Parse(e.to_string()))?;

        parse_status(&body).map(Some)
    }
}

fn parse_status(body: &serde_json::Value) -> Result<LiveStatus, TelemetryError> {
    let equity_str = body
        .get("currentEquity")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TelemetryError::Parse("Missing currentEquity field".to_string()))?;
    let current_equity = Decimal::from_str_canonical(equity_str)
        .map_err(|e| TelemetryError::Parse(format!("Invalid currentEquity: {}", e)))?;

    let current_balance = body
        .get("currentBalance")
        .and_then(|v| v.as_str())
        .and_then(|s| Decimal::from_str_canonical(s).ok());

    let position = body
        .get("position")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let last_update = body
        .get("lastUpdateMs")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| TelemetryError::Parse("Missing lastUpdateMs field".to_string()))?;

    Ok(LiveStatus {
        current_equity,
        current_balance,
        position,
        last_update: TimeMs::new(last_update),
    })
}
