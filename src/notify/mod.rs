//! Notification sink boundary: delivers rendered report documents.
//!
//! Delivery failure never blocks snapshot persistence; the caller leaves
//! the report-sent marker unset and retries delivery on the next run.

use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod webhook;

pub use mock::MockNotifier;
pub use webhook::WebhookNotifier;

/// Sink accepting a rendered document for one recipient.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        rendered_document: &str,
    ) -> Result<(), NotifyError>;
}

/// Error type for notification delivery.
#[derive(Debug, Clone)]
pub enum NotifyError {
    /// Network error reaching the sink.
    Network(String),
    /// Sink rejected the document.
    Rejected { status: u16, message: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Network(msg) => write!(f, "Network error: {}", msg),
            NotifyError::Rejected { status, message } => {
                write!(f, "Delivery rejected ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for NotifyError {}
