//! One ingestion cycle: pull from each configured source and upsert.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use surge_store::Store;

use crate::source::PostSource;

/// A source paired with its per-cycle fetch limit.
#[derive(Clone)]
pub struct SourceRun {
    pub source: Arc<dyn PostSource>,
    pub limit: usize,
}

/// Run one ingestion cycle across all sources. Returns the number of
/// items upserted. Source failures are absorbed: the failing source
/// contributes nothing and the cycle continues.
pub async fn ingest_cycle(store: &dyn Store, runs: &[SourceRun], keywords: &[String]) -> usize {
    if keywords.is_empty() {
        warn!("ingest.no_keywords");
    }
    let cycle_id = Uuid::new_v4().simple().to_string();
    let mut total = 0usize;

    for run in runs {
        let items = match run.source.fetch(keywords, run.limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = run.source.name(), error = %e, "ingest source failed");
                continue;
            }
        };
        let mut upserted = 0usize;
        for item in &items {
            match store.upsert_post(item).await {
                Ok(_) => upserted += 1,
                Err(e) => {
                    warn!(
                        source = run.source.name(),
                        post_id = %item.post_id,
                        error = %e,
                        "ingest upsert failed"
                    );
                }
            }
        }
        info!(
            cycle_id = %cycle_id,
            source = run.source.name(),
            upserted,
            "ingest source complete"
        );
        total += upserted;
    }

    info!(cycle_id = %cycle_id, total, "ingest cycle complete");
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use surge_core::{NormalizedPost, Platform};
    use surge_store::MemoryStore;

    use crate::error::IngestError;
    use crate::source::StaticSource;

    struct FailingSource;

    #[async_trait]
    impl PostSource for FailingSource {
        async fn fetch(
            &self,
            _keywords: &[String],
            _limit: usize,
        ) -> Result<Vec<NormalizedPost>, IngestError> {
            Err(IngestError::Source {
                source_name: "broken".to_string(),
                detail: "connection refused".to_string(),
            })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_cycle() {
        let store = MemoryStore::new();
        let items = vec![
            NormalizedPost::new(Platform::X, "1"),
            NormalizedPost::new(Platform::X, "2"),
        ];
        let runs = vec![
            SourceRun {
                source: Arc::new(FailingSource),
                limit: 10,
            },
            SourceRun {
                source: Arc::new(StaticSource::new("x", items)),
                limit: 10,
            },
        ];

        let total = ingest_cycle(&store, &runs, &["defi".to_string()]).await;
        assert_eq!(total, 2);
        assert_eq!(store.all_posts().await.len(), 2);
    }

    #[tokio::test]
    async fn re_ingestion_upserts_in_place() {
        let store = MemoryStore::new();
        let mut item = NormalizedPost::new(Platform::Reddit, "r1");
        item.like_count = Some(4);
        let runs = vec![SourceRun {
            source: Arc::new(StaticSource::new("reddit", vec![item])),
            limit: 10,
        }];

        ingest_cycle(&store, &runs, &[]).await;
        ingest_cycle(&store, &runs, &[]).await;
        assert_eq!(store.all_posts().await.len(), 1);
    }
}
