//! Daily post-idea generation, idempotent per calendar day.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use surge_core::{today_str, IdeaBatch, TargetingProfile};
use surge_store::Store;

use crate::error::IngestError;

/// Maximum ideas kept per day.
const IDEAS_PER_DAY: usize = 5;

/// Generates short post ideas for a targeting profile.
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    async fn generate(&self, profile: &TargetingProfile) -> Result<Vec<String>, IngestError>;
}

/// Generator used when no completion backend is configured. Yields
/// nothing, so the daily job surfaces "no content" as its failure.
pub struct NoIdeaGenerator;

#[async_trait]
impl IdeaGenerator for NoIdeaGenerator {
    async fn generate(&self, _profile: &TargetingProfile) -> Result<Vec<String>, IngestError> {
        Ok(Vec::new())
    }
}

/// Return today's ideas, generating and persisting them once per day.
///
/// An existing batch for today short-circuits generation entirely, so
/// repeated job runs within one day are no-ops.
pub async fn ensure_today_ideas(
    store: &dyn Store,
    generator: &dyn IdeaGenerator,
    profile: &TargetingProfile,
) -> Result<Vec<String>, IngestError> {
    let day = today_str(Utc::now());
    if let Some(existing) = store.get_ideas(&day).await {
        return Ok(existing.ideas);
    }

    let mut ideas = generator.generate(profile).await?;
    ideas.truncate(IDEAS_PER_DAY);
    if ideas.is_empty() {
        return Err(IngestError::Generation(
            "idea generation returned no content".to_string(),
        ));
    }

    store
        .put_ideas(IdeaBatch {
            day: day.clone(),
            ideas: ideas.clone(),
            generated_at: Utc::now(),
        })
        .await;
    info!(day = %day, count = ideas.len(), "daily ideas generated");
    Ok(ideas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use surge_store::MemoryStore;

    struct FixedGenerator {
        calls: AtomicUsize,
        ideas: Vec<String>,
    }

    #[async_trait]
    impl IdeaGenerator for FixedGenerator {
        async fn generate(&self, _profile: &TargetingProfile) -> Result<Vec<String>, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.ideas.clone())
        }
    }

    fn profile() -> TargetingProfile {
        TargetingProfile {
            id: 1,
            name: "Default profile".to_string(),
            niche: None,
            keywords: vec![],
            watchlist: vec![],
            is_default: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn generates_once_per_day() {
        let store = MemoryStore::new();
        let generator = FixedGenerator {
            calls: AtomicUsize::new(0),
            ideas: vec!["a".to_string(), "b".to_string()],
        };

        let first = ensure_today_ideas(&store, &generator, &profile()).await.unwrap();
        let second = ensure_today_ideas(&store, &generator, &profile()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn caps_at_five_ideas() {
        let store = MemoryStore::new();
        let generator = FixedGenerator {
            calls: AtomicUsize::new(0),
            ideas: (0..8).map(|i| i.to_string()).collect(),
        };
        let ideas = ensure_today_ideas(&store, &generator, &profile()).await.unwrap();
        assert_eq!(ideas.len(), 5);
    }

    #[tokio::test]
    async fn empty_generation_is_an_error() {
        let store = MemoryStore::new();
        let generator = FixedGenerator {
            calls: AtomicUsize::new(0),
            ideas: vec![],
        };
        assert!(ensure_today_ideas(&store, &generator, &profile()).await.is_err());
    }
}
