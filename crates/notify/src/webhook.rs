//! Generic HTTP webhook notifier.
//!
//! Delivers messages as JSON payloads to a configured endpoint. The body
//! is the serialized [`OutboundMessage`] — `{text, category, payload}`.

use async_trait::async_trait;

use crate::traits::{Notifier, NotifyError, OutboundMessage};

/// Delivers messages as JSON over HTTP to a configured endpoint.
#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, NotifyError> {
        if url.is_empty() {
            return Err(NotifyError::Config("webhook URL must not be empty".to_string()));
        }
        Ok(Self {
            url,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(message).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook returned HTTP {status}"
            )));
        }
        tracing::info!(url = %self.url, "Webhook notification sent");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_rejected() {
        assert!(WebhookNotifier::new(String::new()).is_err());
    }

    #[test]
    fn channel_name_is_webhook() {
        let notifier = WebhookNotifier::new("https://example.invalid/hook".to_string()).unwrap();
        assert_eq!(notifier.channel_name(), "webhook");
    }
}
