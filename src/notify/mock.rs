//! Recording notifier for tests, with switchable failure injection.

use super::{NotifyError, Notifier};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// One captured delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub rendered_document: String,
}

/// Notifier that records sends in memory and can be told to fail.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        rendered_document: &str,
    ) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Network("mock delivery failure".to_string()));
        }
        self.sent.lock().expect("mock lock poisoned").push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            rendered_document: rendered_document.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_sends() {
        let notifier = MockNotifier::new();
        notifier.send("a@example.com", "July", "doc").await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "a@example.com");
    }

    #[tokio::test]
    async fn test_mock_failure_records_nothing() {
        let notifier = MockNotifier::new();
        notifier.set_fail(true);
        assert!(notifier.send("a@example.com", "July", "doc").await.is_err());
        assert!(notifier.sent().is_empty());

        notifier.set_fail(false);
        notifier.send("a@example.com", "July", "doc").await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
    }
}
