use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One day's generated post ideas. At most one batch per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaBatch {
    /// Day key, `YYYY-MM-DD` in UTC.
    pub day: String,
    pub ideas: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Day key for idea batches.
pub fn today_str(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Audit row appended after a successful outbound delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: u64,
    pub channel: String,
    pub category: Option<String>,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
