//! Email delivery provider client boundary.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::activities::ProviderError;

/// One outbound email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Configured sender address.
    pub from: String,
    /// Recipient, already normalized.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

/// Client for the external email delivery provider.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Submits one send request.
    async fn send(&self, message: EmailMessage) -> Result<(), ProviderError>;
}

#[derive(Debug, Default)]
struct InMemoryMailState {
    sent: Vec<EmailMessage>,
    fail_on_send: bool,
}

/// In-memory mail client for tests and the demo deployment.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailClient {
    state: Arc<RwLock<InMemoryMailState>>,
}

impl InMemoryMailClient {
    /// Creates a new in-memory mail client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the client to reject send attempts.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of delivered messages.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns all delivered messages, in send order.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the most recently delivered message.
    pub fn last_sent(&self) -> Option<EmailMessage> {
        self.state.read().unwrap().sent.last().cloned()
    }
}

#[async_trait]
impl MailClient for InMemoryMailClient {
    async fn send(&self, message: EmailMessage) -> Result<(), ProviderError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(ProviderError::Transport {
                provider: "mail",
                detail: "delivery provider unreachable".to_string(),
            });
        }

        state.sent.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            from: "shop@example.com".into(),
            to: "a@b.com".into(),
            subject: "You've abandoned your shopping cart!".into(),
            html_body: "<p>come back</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_send_is_captured() {
        let client = InMemoryMailClient::new();
        client.send(message()).await.unwrap();
        assert_eq!(client.sent_count(), 1);
        assert_eq!(client.last_sent().unwrap().to, "a@b.com");
    }

    #[tokio::test]
    async fn test_fail_on_send() {
        let client = InMemoryMailClient::new();
        client.set_fail_on_send(true);
        let err = client.send(message()).await.unwrap_err();
        assert!(err.to_string().contains("unreachable"));
        assert_eq!(client.sent_count(), 0);
    }
}
