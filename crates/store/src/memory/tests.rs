use chrono::{Duration, Utc};

use surge_core::config::TargetingConfig;
use surge_core::{JobConfig, JobKind, JobRun, NormalizedPost, Platform, PostKey, RunStatus};

use crate::backend::{ProfileUpdate, Store};
use crate::memory::MemoryStore;

fn item(post_id: &str) -> NormalizedPost {
    let mut item = NormalizedPost::new(Platform::X, post_id);
    item.author = Some("@someone".to_string());
    item.text = Some("hello world".to_string());
    item.like_count = Some(3);
    item
}

fn config(kind: JobKind, priority: i32) -> JobConfig {
    JobConfig {
        id: 0,
        job_kind: kind,
        name: None,
        cron: "*/30 * * * *".to_string(),
        enabled: true,
        priority,
        concurrency_limit: 1,
        lock_timeout_seconds: 300,
        parameters: Default::default(),
        profile_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn upsert_creates_then_updates() {
    let store = MemoryStore::new();

    let created = store.upsert_post(&item("p1")).await.unwrap();
    assert_eq!(created.author.as_deref(), Some("someone"));
    assert_eq!(created.like_count, 3);
    assert!(!created.trending);

    let mut update = NormalizedPost::new(Platform::X, "p1");
    update.like_count = Some(10);
    let updated = store.upsert_post(&update).await.unwrap();
    assert_eq!(updated.like_count, 10);
    // Absent fields keep their stored values.
    assert_eq!(updated.text, "hello world");
    assert_eq!(updated.author.as_deref(), Some("someone"));

    assert_eq!(store.all_posts().await.len(), 1);
}

#[tokio::test]
async fn put_post_requires_existing_row() {
    let store = MemoryStore::new();
    let post = store.upsert_post(&item("p1")).await.unwrap();

    let mut missing = post.clone();
    missing.post_id = "other".to_string();
    assert!(store.put_post(&missing).await.is_err());

    let mut scored = post;
    scored.virality_score = 0.7;
    store.put_post(&scored).await.unwrap();
    let key = PostKey::new(Platform::X, "p1");
    assert_eq!(store.get_post(&key).await.unwrap().virality_score, 0.7);
}

#[tokio::test]
async fn top_conversations_orders_trending_then_virality() {
    let store = MemoryStore::new();
    for (id, trending, virality) in [("a", false, 0.9), ("b", true, 0.2), ("c", true, 0.8)] {
        let mut post = store.upsert_post(&item(id)).await.unwrap();
        post.trending = trending;
        post.trending_since = trending.then(Utc::now);
        post.virality_score = virality;
        store.put_post(&post).await.unwrap();
    }

    let top = store.top_conversations(10, None).await;
    let ids: Vec<&str> = top.iter().map(|p| p.post_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);

    let limited = store.top_conversations(1, None).await;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].post_id, "c");
}

#[tokio::test]
async fn top_conversations_respects_lookback() {
    let store = MemoryStore::new();
    let mut old = store.upsert_post(&item("old")).await.unwrap();
    old.created_at = Utc::now() - Duration::hours(48);
    store.put_post(&old).await.unwrap();
    store.upsert_post(&item("fresh")).await.unwrap();

    let cutoff = Utc::now() - Duration::hours(24);
    let top = store.top_conversations(10, Some(cutoff)).await;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].post_id, "fresh");
}

#[tokio::test]
async fn lease_limit_and_release() {
    let store = MemoryStore::new();
    let now = Utc::now();

    let first = store.acquire_lease(1, 1, 300, now).await;
    assert!(first.is_some());
    assert!(store.acquire_lease(1, 1, 300, now).await.is_none());

    // Releasing frees exactly one slot.
    let token = first.unwrap().token;
    assert!(store.release_lease(1, &token).await);
    assert!(store.acquire_lease(1, 1, 300, now).await.is_some());

    // Releasing an unknown token is a no-op.
    assert!(!store.release_lease(1, "nope").await);
}

#[tokio::test]
async fn expired_leases_are_purged_on_acquire() {
    let store = MemoryStore::new();
    let now = Utc::now();

    store.acquire_lease(1, 1, 30, now).await.unwrap();
    assert!(store.acquire_lease(1, 1, 30, now).await.is_none());

    // Past the TTL a fresh acquire reclaims the slot.
    let later = now + Duration::seconds(31);
    assert!(store.acquire_lease(1, 1, 30, later).await.is_some());
    assert_eq!(store.active_leases(1, later).await, 1);
}

#[tokio::test]
async fn leases_are_scoped_per_config() {
    let store = MemoryStore::new();
    let now = Utc::now();
    assert!(store.acquire_lease(1, 1, 300, now).await.is_some());
    assert!(store.acquire_lease(2, 1, 300, now).await.is_some());
}

#[tokio::test]
async fn configs_list_ordered_by_priority_then_id() {
    let store = MemoryStore::new();
    store.create_config(config(JobKind::IngestRank, 5)).await.unwrap();
    store.create_config(config(JobKind::GenReplies, 1)).await.unwrap();
    store.create_config(config(JobKind::DailyIdeas, 5)).await.unwrap();

    let listed = store.list_configs().await;
    let kinds: Vec<JobKind> = listed.iter().map(|c| c.job_kind).collect();
    assert_eq!(
        kinds,
        vec![JobKind::GenReplies, JobKind::IngestRank, JobKind::DailyIdeas]
    );
}

#[tokio::test]
async fn delete_config_drops_its_leases() {
    let store = MemoryStore::new();
    let cfg = store.create_config(config(JobKind::IngestRank, 5)).await.unwrap();
    let now = Utc::now();
    store.acquire_lease(cfg.id, 1, 300, now).await.unwrap();

    assert!(store.delete_config(cfg.id).await);
    assert_eq!(store.active_leases(cfg.id, now).await, 0);
    assert!(!store.delete_config(cfg.id).await);
}

#[tokio::test]
async fn job_runs_are_append_only_newest_first() {
    let store = MemoryStore::new();
    for status in [RunStatus::Success, RunStatus::Error] {
        store
            .append_job_run(JobRun {
                id: 0,
                job_kind: JobKind::IngestRank,
                config_id: 1,
                status,
                run_at: Utc::now(),
                duration_ms: 12.0,
                detail: None,
                correlation_id: "c".to_string(),
            })
            .await;
    }

    let recent = store.recent_job_runs(10).await;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].status, RunStatus::Error);
    assert!(recent[0].id > recent[1].id);
}

#[tokio::test]
async fn default_profile_seeded_once() {
    let store = MemoryStore::new();
    let seed = TargetingConfig {
        niche: Some("fintech".to_string()),
        keywords: vec![" defi ".to_string(), String::new()],
        watchlist: vec!["@whale".to_string()],
    };

    let first = store.ensure_default_profile(&seed).await.unwrap();
    assert!(first.is_default && first.is_active);
    assert_eq!(first.keywords, vec!["defi"]);

    let second = store.ensure_default_profile(&seed).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(store.list_profiles(true).await.len(), 1);
}

#[tokio::test]
async fn default_flag_moves_with_make_default() {
    let store = MemoryStore::new();
    let seed = TargetingConfig::default();
    let default = store.ensure_default_profile(&seed).await.unwrap();

    let extra = store
        .create_profile(
            surge_core::TargetingProfile {
                id: 0,
                name: "Launch push".to_string(),
                niche: None,
                keywords: vec!["launch".to_string()],
                watchlist: vec![],
                is_default: false,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            false,
        )
        .await
        .unwrap();

    let updated = store
        .update_profile(
            extra.id,
            ProfileUpdate {
                make_default: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_default);
    assert!(!store.get_profile(Some(default.id), true).await.unwrap().is_default);

    // The default profile cannot be deactivated.
    assert!(store.deactivate_profile(extra.id).await.is_err());
    assert!(store.deactivate_profile(default.id).await.is_ok());
}

#[tokio::test]
async fn idea_batches_keyed_by_day() {
    let store = MemoryStore::new();
    assert!(store.get_ideas("2026-08-06").await.is_none());
    store
        .put_ideas(surge_core::IdeaBatch {
            day: "2026-08-06".to_string(),
            ideas: vec!["one".to_string()],
            generated_at: Utc::now(),
        })
        .await;
    assert_eq!(store.get_ideas("2026-08-06").await.unwrap().ideas, vec!["one"]);
}
