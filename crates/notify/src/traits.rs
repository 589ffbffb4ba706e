//! Notifier trait definition and shared error types.

use async_trait::async_trait;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A message ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OutboundMessage {
    /// Rendered message body.
    pub text: String,
    /// Message category (e.g. "trending_alert", "job_alert", "daily_ideas").
    pub category: Option<String>,
    /// Optional structured payload accompanying the text.
    pub payload: Option<serde_json::Value>,
}

impl OutboundMessage {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: Some(category.into()),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Trait for notification channel implementations.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message through this channel.
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g. "telegram", "webhook").
    fn channel_name(&self) -> &str;
}
