use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named bundle of keywords/watchlist/niche used to parameterize
/// ingestion, scoring bonuses, and content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingProfile {
    pub id: u64,
    pub name: String,
    pub niche: Option<String>,
    pub keywords: Vec<String>,
    pub watchlist: Vec<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trim terms and drop empties. Keeps original casing; matching code
/// lowercases at comparison time.
pub fn normalize_terms(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
