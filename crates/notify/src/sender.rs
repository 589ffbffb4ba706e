//! Delivery front door for the core: absorbs channel failures and
//! records successful deliveries in the store's notification audit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use surge_core::NotificationRecord;
use surge_store::Store;

use crate::traits::{Notifier, NotifyError, OutboundMessage};

/// Log-only channel used when no real channel is configured. Always
/// reports success so local runs still exercise the alert paths.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        info!(
            category = message.category.as_deref().unwrap_or("-"),
            text = %message.text,
            "notification (log only)"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

/// Sends one message to every configured channel.
///
/// Individual channel failures don't block other channels and are never
/// surfaced to the caller as errors — a failed delivery is a degraded
/// outcome, not a job failure. Returns whether at least one channel
/// delivered.
pub struct AlertSender {
    channels: Vec<Box<dyn Notifier>>,
    store: Arc<dyn Store>,
}

impl AlertSender {
    pub fn new(channels: Vec<Box<dyn Notifier>>, store: Arc<dyn Store>) -> Self {
        Self { channels, store }
    }

    pub async fn send(&self, message: &OutboundMessage) -> bool {
        if self.channels.is_empty() {
            info!("no notification channels configured; skip notify");
            return false;
        }

        let mut delivered = false;
        for channel in &self.channels {
            match channel.send(message).await {
                Ok(()) => {
                    delivered = true;
                    self.store
                        .append_notification(NotificationRecord {
                            id: 0,
                            channel: channel.channel_name().to_string(),
                            category: message.category.clone(),
                            message: message.text.clone(),
                            payload: message.payload.clone(),
                            created_at: Utc::now(),
                        })
                        .await;
                }
                Err(e) => {
                    warn!(
                        channel = channel.channel_name(),
                        error = %e,
                        "notification delivery failed"
                    );
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use surge_store::MemoryStore;

    struct MockNotifier {
        name: String,
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, _message: &OutboundMessage) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(NotifyError::Delivery("mock failure".to_string()))
            } else {
                Ok(())
            }
        }

        fn channel_name(&self) -> &str {
            &self.name
        }
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block_and_records_success() {
        let store = Arc::new(MemoryStore::new());
        let ok_count = Arc::new(AtomicUsize::new(0));

        let channels: Vec<Box<dyn Notifier>> = vec![
            Box::new(MockNotifier {
                name: "fail".to_string(),
                send_count: Arc::new(AtomicUsize::new(0)),
                should_fail: true,
            }),
            Box::new(MockNotifier {
                name: "ok".to_string(),
                send_count: ok_count.clone(),
                should_fail: false,
            }),
        ];

        let sender = AlertSender::new(channels, store.clone());
        let message = OutboundMessage::new("hello", "trending_alert");
        assert!(sender.send(&message).await);
        assert_eq!(ok_count.load(Ordering::SeqCst), 1);

        let recorded = store.recent_notifications(10).await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].channel, "ok");
        assert_eq!(recorded[0].category.as_deref(), Some("trending_alert"));
    }

    #[tokio::test]
    async fn all_failures_return_false() {
        let store = Arc::new(MemoryStore::new());
        let channels: Vec<Box<dyn Notifier>> = vec![Box::new(MockNotifier {
            name: "fail".to_string(),
            send_count: Arc::new(AtomicUsize::new(0)),
            should_fail: true,
        })];
        let sender = AlertSender::new(channels, store.clone());
        assert!(!sender.send(&OutboundMessage::new("x", "job_alert")).await);
        assert!(store.recent_notifications(10).await.is_empty());
    }

    #[tokio::test]
    async fn no_channels_is_a_silent_skip() {
        let store = Arc::new(MemoryStore::new());
        let sender = AlertSender::new(Vec::new(), store);
        assert!(!sender.send(&OutboundMessage::new("x", "job_alert")).await);
    }
}
