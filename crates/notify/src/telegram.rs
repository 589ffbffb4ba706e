//! Telegram Bot API notifier.
//!
//! Delivers messages via the Telegram Bot API `sendMessage` endpoint,
//! with link previews disabled and rate limit handling.

use async_trait::async_trait;

use surge_core::config::TelegramConfig;

use crate::traits::{Notifier, NotifyError, OutboundMessage};

/// Sends messages via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Build a notifier from config. Returns [`NotifyError::Config`] when
    /// the bot token or chat id is missing.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NotifyError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))?;
        let chat_id = config
            .chat_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| NotifyError::Config("TELEGRAM_CHAT_ID is not set".to_string()))?;

        Ok(Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message.text,
            "disable_web_page_preview": true,
        });

        tracing::debug!(
            chat_id = %self.chat_id,
            category = message.category.as_deref().unwrap_or("-"),
            "Sending Telegram notification"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            tracing::info!(
                chat_id = %self.chat_id,
                length = message.text.len(),
                "Telegram notification sent"
            );
            return Ok(());
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        Err(NotifyError::Delivery(format!(
            "Telegram API error: {description}"
        )))
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}
