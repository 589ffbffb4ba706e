//! Trending-hashtag supplier with a TTL cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::IngestError;

/// Supplies the platform's currently trending hashtags.
#[async_trait]
pub trait HashtagSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<String>, IngestError>;
}

/// Fixed tag list for tests and deployments without a trends API.
#[derive(Default)]
pub struct StaticHashtags(pub Vec<String>);

#[async_trait]
impl HashtagSource for StaticHashtags {
    async fn fetch(&self) -> Result<Vec<String>, IngestError> {
        Ok(self.0.clone())
    }
}

/// Lowercase tags, strip leading `#`, drop empties.
pub fn normalize_hashtags(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase().trim_start_matches('#').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

struct CacheSlot {
    tags: Vec<String>,
    fetched_at: Instant,
}

/// TTL cache over a [`HashtagSource`].
///
/// Failures are absorbed: a failed refresh serves the last known tags
/// (stale) or an empty list when nothing was ever fetched.
pub struct CachedHashtags {
    source: Arc<dyn HashtagSource>,
    ttl: Duration,
    slot: Mutex<Option<CacheSlot>>,
}

impl CachedHashtags {
    pub fn new(source: Arc<dyn HashtagSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Current trending tags, normalized. Never fails.
    pub async fn get(&self) -> Vec<String> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return cached.tags.clone();
            }
        }

        match self.source.fetch().await {
            Ok(raw) => {
                let tags = normalize_hashtags(&raw);
                *slot = Some(CacheSlot {
                    tags: tags.clone(),
                    fetched_at: Instant::now(),
                });
                tags
            }
            Err(e) => {
                warn!(error = %e, "failed to load trending hashtags");
                slot.as_ref().map(|c| c.tags.clone()).unwrap_or_default()
            }
        }
    }
}
