//! The [`Store`] trait — the narrow contract the scoring, alerting, and
//! scheduling components run against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use surge_core::{
    config::TargetingConfig, IdeaBatch, JobConfig, JobRun, Lease, NormalizedPost,
    NotificationRecord, Post, PostKey, TargetingProfile,
};

use crate::error::StoreError;

/// Field-level changes applied to a targeting profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub niche: Option<Option<String>>,
    pub keywords: Option<Vec<String>>,
    pub watchlist: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub make_default: bool,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ── Posts ─────────────────────────────────────────────────

    /// Create or update a post from an ingestion item, keyed by
    /// (platform, post_id). Counters present in the item overwrite stored
    /// values; absent counters keep them. Refreshes `collected_at`.
    async fn upsert_post(&self, item: &NormalizedPost) -> Result<Post, StoreError>;

    async fn get_post(&self, key: &PostKey) -> Option<Post>;

    async fn all_posts(&self) -> Vec<Post>;

    /// Whole-row replace by key. Errors if the post does not exist.
    async fn put_post(&self, post: &Post) -> Result<(), StoreError>;

    /// Top conversations ordered by (trending desc, virality desc),
    /// optionally restricted to posts created at or after `min_created_at`.
    async fn top_conversations(
        &self,
        limit: usize,
        min_created_at: Option<DateTime<Utc>>,
    ) -> Vec<Post>;

    async fn trending_posts(&self) -> Vec<Post>;

    // ── Scheduler configs ─────────────────────────────────────

    /// Insert a config; the store assigns id and timestamps.
    async fn create_config(&self, config: JobConfig) -> Result<JobConfig, StoreError>;

    /// Whole-row update by id; bumps `updated_at`.
    async fn update_config(&self, config: JobConfig) -> Result<JobConfig, StoreError>;

    async fn delete_config(&self, id: u64) -> bool;

    async fn get_config(&self, id: u64) -> Option<JobConfig>;

    /// All configs ordered by (priority, id).
    async fn list_configs(&self) -> Vec<JobConfig>;

    // ── Leases ────────────────────────────────────────────────

    /// Acquire one execution slot for a config, or `None` when the config
    /// is already at `limit` concurrent leases.
    ///
    /// One transaction: purge leases for this config whose `expires_at`
    /// has passed, count the remainder, and insert the new lease only if
    /// the count is below `limit`. Backends must keep the purge + count +
    /// insert atomic; a non-transactional implementation would reintroduce
    /// a double-acquire race between concurrent callers.
    async fn acquire_lease(
        &self,
        config_id: u64,
        limit: u32,
        ttl_seconds: u32,
        now: DateTime<Utc>,
    ) -> Option<Lease>;

    /// Delete the lease matching both fields. No-op if already purged.
    async fn release_lease(&self, config_id: u64, token: &str) -> bool;

    /// Unexpired lease count for a config.
    async fn active_leases(&self, config_id: u64, now: DateTime<Utc>) -> usize;

    // ── Job runs (append-only audit) ──────────────────────────

    async fn append_job_run(&self, run: JobRun) -> JobRun;

    /// Most recent runs first.
    async fn recent_job_runs(&self, limit: usize) -> Vec<JobRun>;

    // ── Targeting profiles ────────────────────────────────────

    /// Idempotently seed the default profile from static config. Returns
    /// the default (re-activating or re-flagging an existing row if the
    /// flags were lost).
    async fn ensure_default_profile(
        &self,
        seed: &TargetingConfig,
    ) -> Result<TargetingProfile, StoreError>;

    /// Fetch a profile by id, or the default when `id` is `None`.
    async fn get_profile(
        &self,
        id: Option<u64>,
        allow_inactive: bool,
    ) -> Result<TargetingProfile, StoreError>;

    async fn list_profiles(&self, include_inactive: bool) -> Vec<TargetingProfile>;

    async fn create_profile(
        &self,
        profile: TargetingProfile,
        make_default: bool,
    ) -> Result<TargetingProfile, StoreError>;

    async fn update_profile(
        &self,
        id: u64,
        changes: ProfileUpdate,
    ) -> Result<TargetingProfile, StoreError>;

    /// Deactivating the default profile is rejected.
    async fn deactivate_profile(&self, id: u64) -> Result<TargetingProfile, StoreError>;

    // ── Idea batches ──────────────────────────────────────────

    async fn get_ideas(&self, day: &str) -> Option<IdeaBatch>;

    async fn put_ideas(&self, batch: IdeaBatch);

    // ── Notification audit ────────────────────────────────────

    async fn append_notification(&self, record: NotificationRecord) -> NotificationRecord;

    async fn recent_notifications(&self, limit: usize) -> Vec<NotificationRecord>;
}
