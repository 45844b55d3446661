//! Webhook-backed notification sink.

use super::{NotifyError, Notifier};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Posts rendered documents to a delivery webhook (mail relay or similar).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        rendered_document: &str,
    ) -> Result<(), NotifyError> {
        debug!("Delivering report to {}", recipient);

        let payload = serde_json::json!({
            "recipient": recipient,
            "subject": subject,
            "renderedDocument": rendered_document,
        });

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(NotifyError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(NotifyError::Rejected {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(NotifyError::Rejected {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            Ok(())
        })
        .await
    }
}
