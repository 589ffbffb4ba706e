//! In-memory [`Store`] backend.
//!
//! All tables live behind one `tokio::sync::RwLock`; each trait call takes
//! the lock once, so every mutating operation is a single transaction.
//! Used by the worker in single-process deployments and by tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use surge_core::{
    config::TargetingConfig, new_lease_token, normalize_terms, IdeaBatch, JobConfig, JobRun,
    Lease, NormalizedPost, NotificationRecord, Post, PostKey, TargetingProfile,
};

use crate::backend::{ProfileUpdate, Store};
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    posts: HashMap<PostKey, Post>,
    configs: BTreeMap<u64, JobConfig>,
    leases: Vec<Lease>,
    job_runs: Vec<JobRun>,
    profiles: BTreeMap<u64, TargetingProfile>,
    ideas: HashMap<String, IdeaBatch>,
    notifications: Vec<NotificationRecord>,

    config_seq: u64,
    lease_seq: u64,
    run_seq: u64,
    profile_seq: u64,
    notification_seq: u64,
}

/// In-memory store. Cheap to clone handles via `Arc<MemoryStore>`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_top(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.trending.cmp(&a.trending).then(
            b.virality_score
                .partial_cmp(&a.virality_score)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
}

fn default_profile(profiles: &BTreeMap<u64, TargetingProfile>) -> Option<&TargetingProfile> {
    profiles
        .values()
        .filter(|p| p.is_active && p.is_default)
        .max_by_key(|p| p.created_at)
        .or_else(|| {
            profiles
                .values()
                .filter(|p| p.is_active)
                .max_by_key(|p| p.created_at)
        })
}

#[async_trait]
impl Store for MemoryStore {
    // ── Posts ─────────────────────────────────────────────────

    async fn upsert_post(&self, item: &NormalizedPost) -> Result<Post, StoreError> {
        let now = Utc::now();
        let key = PostKey::new(item.platform, item.post_id.clone());
        let mut inner = self.inner.write().await;

        let post = match inner.posts.get_mut(&key) {
            Some(existing) => {
                if let Some(text) = &item.text {
                    existing.text = text.clone();
                }
                if let Some(url) = &item.url {
                    existing.url = Some(url.clone());
                }
                if let Some(author) = item.clean_author() {
                    existing.author = Some(author);
                }
                if let Some(created) = item.created_at {
                    existing.created_at = created;
                }
                if let Some(v) = item.like_count {
                    existing.like_count = v;
                }
                if let Some(v) = item.reply_count {
                    existing.reply_count = v;
                }
                if let Some(v) = item.repost_count {
                    existing.repost_count = v;
                }
                if let Some(v) = item.quote_count {
                    existing.quote_count = v;
                }
                if let Some(v) = item.view_count {
                    existing.view_count = v;
                }
                existing.collected_at = now;
                existing.clone()
            }
            None => {
                let post = Post {
                    platform: item.platform,
                    post_id: item.post_id.clone(),
                    author: item.clean_author(),
                    url: item.url.clone(),
                    text: item.text.clone().unwrap_or_default(),
                    created_at: item.created_at.unwrap_or(now),
                    collected_at: now,
                    like_count: item.like_count.unwrap_or(0),
                    reply_count: item.reply_count.unwrap_or(0),
                    repost_count: item.repost_count.unwrap_or(0),
                    quote_count: item.quote_count.unwrap_or(0),
                    view_count: item.view_count.unwrap_or(0),
                    virality_score: 0.0,
                    velocity_score: 0.0,
                    trending: false,
                    trending_since: None,
                    trending_candidate_since: None,
                    last_alerted_at: None,
                    last_alerted_virality: None,
                    tones: Vec::new(),
                    reply_drafts: Vec::new(),
                };
                inner.posts.insert(key, post.clone());
                post
            }
        };
        Ok(post)
    }

    async fn get_post(&self, key: &PostKey) -> Option<Post> {
        self.inner.read().await.posts.get(key).cloned()
    }

    async fn all_posts(&self) -> Vec<Post> {
        self.inner.read().await.posts.values().cloned().collect()
    }

    async fn put_post(&self, post: &Post) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = post.key();
        match inner.posts.get_mut(&key) {
            Some(slot) => {
                *slot = post.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("post {key}"))),
        }
    }

    async fn top_conversations(
        &self,
        limit: usize,
        min_created_at: Option<DateTime<Utc>>,
    ) -> Vec<Post> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| min_created_at.map_or(true, |min| p.created_at >= min))
            .cloned()
            .collect();
        sort_top(&mut posts);
        posts.truncate(limit);
        posts
    }

    async fn trending_posts(&self) -> Vec<Post> {
        self.inner
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.trending)
            .cloned()
            .collect()
    }

    // ── Scheduler configs ─────────────────────────────────────

    async fn create_config(&self, mut config: JobConfig) -> Result<JobConfig, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.config_seq += 1;
        config.id = inner.config_seq;
        config.created_at = now;
        config.updated_at = now;
        inner.configs.insert(config.id, config.clone());
        Ok(config)
    }

    async fn update_config(&self, mut config: JobConfig) -> Result<JobConfig, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.configs.contains_key(&config.id) {
            return Err(StoreError::NotFound(format!("config {}", config.id)));
        }
        config.updated_at = Utc::now();
        inner.configs.insert(config.id, config.clone());
        Ok(config)
    }

    async fn delete_config(&self, id: u64) -> bool {
        let mut inner = self.inner.write().await;
        inner.leases.retain(|l| l.config_id != id);
        inner.configs.remove(&id).is_some()
    }

    async fn get_config(&self, id: u64) -> Option<JobConfig> {
        self.inner.read().await.configs.get(&id).cloned()
    }

    async fn list_configs(&self) -> Vec<JobConfig> {
        let inner = self.inner.read().await;
        let mut configs: Vec<JobConfig> = inner.configs.values().cloned().collect();
        configs.sort_by_key(|c| (c.priority, c.id));
        configs
    }

    // ── Leases ────────────────────────────────────────────────

    async fn acquire_lease(
        &self,
        config_id: u64,
        limit: u32,
        ttl_seconds: u32,
        now: DateTime<Utc>,
    ) -> Option<Lease> {
        let mut inner = self.inner.write().await;

        // Purge expired leases for this config, then count-and-insert —
        // all under the same write lock, so concurrent acquires serialize.
        inner
            .leases
            .retain(|l| l.config_id != config_id || l.expires_at > now);

        let active = inner
            .leases
            .iter()
            .filter(|l| l.config_id == config_id)
            .count();
        if active >= limit as usize {
            return None;
        }

        inner.lease_seq += 1;
        let lease = Lease {
            id: inner.lease_seq,
            config_id,
            token: new_lease_token(),
            acquired_at: now,
            expires_at: now + Duration::seconds(i64::from(ttl_seconds)),
        };
        inner.leases.push(lease.clone());
        Some(lease)
    }

    async fn release_lease(&self, config_id: u64, token: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.leases.len();
        inner
            .leases
            .retain(|l| !(l.config_id == config_id && l.token == token));
        inner.leases.len() != before
    }

    async fn active_leases(&self, config_id: u64, now: DateTime<Utc>) -> usize {
        self.inner
            .read()
            .await
            .leases
            .iter()
            .filter(|l| l.config_id == config_id && l.expires_at > now)
            .count()
    }

    // ── Job runs ──────────────────────────────────────────────

    async fn append_job_run(&self, mut run: JobRun) -> JobRun {
        let mut inner = self.inner.write().await;
        inner.run_seq += 1;
        run.id = inner.run_seq;
        inner.job_runs.push(run.clone());
        run
    }

    async fn recent_job_runs(&self, limit: usize) -> Vec<JobRun> {
        let inner = self.inner.read().await;
        inner.job_runs.iter().rev().take(limit).cloned().collect()
    }

    // ── Targeting profiles ────────────────────────────────────

    async fn ensure_default_profile(
        &self,
        seed: &TargetingConfig,
    ) -> Result<TargetingProfile, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        if !inner.profiles.is_empty() {
            // Prefer an active default; repair the flags when they were lost.
            let active_id = inner
                .profiles
                .values()
                .filter(|p| p.is_active)
                .max_by_key(|p| (p.is_default, p.created_at))
                .map(|p| p.id);
            let id = match active_id {
                Some(id) => id,
                None => {
                    // Rows exist but all inactive; re-activate the newest.
                    inner
                        .profiles
                        .values()
                        .max_by_key(|p| p.created_at)
                        .map(|p| p.id)
                        .expect("non-empty profile table")
                }
            };
            let profile = inner.profiles.get_mut(&id).expect("profile by id");
            profile.is_active = true;
            profile.is_default = true;
            return Ok(profile.clone());
        }

        inner.profile_seq += 1;
        let profile = TargetingProfile {
            id: inner.profile_seq,
            name: "Default profile".to_string(),
            niche: seed.niche.clone(),
            keywords: normalize_terms(&seed.keywords),
            watchlist: normalize_terms(&seed.watchlist),
            is_default: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_profile(
        &self,
        id: Option<u64>,
        allow_inactive: bool,
    ) -> Result<TargetingProfile, StoreError> {
        let inner = self.inner.read().await;
        let profile = match id {
            Some(id) => inner
                .profiles
                .get(&id)
                .filter(|p| allow_inactive || p.is_active)
                .cloned(),
            None => default_profile(&inner.profiles).cloned(),
        };
        profile.ok_or_else(|| StoreError::NotFound("targeting profile".to_string()))
    }

    async fn list_profiles(&self, include_inactive: bool) -> Vec<TargetingProfile> {
        let inner = self.inner.read().await;
        let mut profiles: Vec<TargetingProfile> = inner
            .profiles
            .values()
            .filter(|p| include_inactive || p.is_active)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| (std::cmp::Reverse(p.is_default), std::cmp::Reverse(p.created_at)));
        profiles
    }

    async fn create_profile(
        &self,
        mut profile: TargetingProfile,
        make_default: bool,
    ) -> Result<TargetingProfile, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.profile_seq += 1;
        profile.id = inner.profile_seq;
        profile.keywords = normalize_terms(&profile.keywords);
        profile.watchlist = normalize_terms(&profile.watchlist);
        profile.is_active = true;
        profile.is_default = make_default;
        profile.created_at = now;
        profile.updated_at = now;
        if make_default {
            for p in inner.profiles.values_mut() {
                p.is_default = false;
            }
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update_profile(
        &self,
        id: u64,
        changes: ProfileUpdate,
    ) -> Result<TargetingProfile, StoreError> {
        let mut inner = self.inner.write().await;
        if changes.make_default {
            for p in inner.profiles.values_mut() {
                if p.id != id {
                    p.is_default = false;
                }
            }
        }
        let profile = inner
            .profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {id}")))?;
        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if !name.is_empty() {
                profile.name = name;
            }
        }
        if let Some(niche) = changes.niche {
            profile.niche = niche.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        }
        if let Some(keywords) = changes.keywords {
            profile.keywords = normalize_terms(&keywords);
        }
        if let Some(watchlist) = changes.watchlist {
            profile.watchlist = normalize_terms(&watchlist);
        }
        if let Some(active) = changes.is_active {
            profile.is_active = active;
        }
        if changes.make_default {
            profile.is_default = true;
            profile.is_active = true;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn deactivate_profile(&self, id: u64) -> Result<TargetingProfile, StoreError> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {id}")))?;
        if profile.is_default {
            return Err(StoreError::Invalid(
                "cannot deactivate the default targeting profile".to_string(),
            ));
        }
        profile.is_active = false;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    // ── Idea batches ──────────────────────────────────────────

    async fn get_ideas(&self, day: &str) -> Option<IdeaBatch> {
        self.inner.read().await.ideas.get(day).cloned()
    }

    async fn put_ideas(&self, batch: IdeaBatch) {
        self.inner.write().await.ideas.insert(batch.day.clone(), batch);
    }

    // ── Notification audit ────────────────────────────────────

    async fn append_notification(&self, mut record: NotificationRecord) -> NotificationRecord {
        let mut inner = self.inner.write().await;
        inner.notification_seq += 1;
        record.id = inner.notification_seq;
        inner.notifications.push(record.clone());
        record
    }

    async fn recent_notifications(&self, limit: usize) -> Vec<NotificationRecord> {
        let inner = self.inner.read().await;
        inner
            .notifications
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests;
