//! Job handler registry and the built-in handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use surge_core::{Config, JobKind, JobParams, TargetingProfile};
use surge_ingest::{
    ensure_today_ideas, ingest_cycle, CachedHashtags, IdeaGenerator, PostSource, ReplyDrafter,
    SourceRun,
};
use surge_notify::{AlertSender, OutboundMessage};
use surge_ranking::{rank_and_mark, select_alerts, AlertKind, RankOptions};
use surge_store::Store;

use crate::error::SchedulerError;

/// Everything a job handler may touch: the store and the collaborator
/// handles. Passed explicitly — handlers hold no global state.
pub struct JobContext {
    pub store: Arc<dyn Store>,
    pub sender: Arc<AlertSender>,
    pub drafter: Arc<dyn ReplyDrafter>,
    pub ideas: Arc<dyn IdeaGenerator>,
    pub hashtags: Arc<CachedHashtags>,
    pub sources: Vec<Arc<dyn PostSource>>,
    pub config: Config,
}

/// One schedulable job. Unknown parameter keys are handler-specific and
/// ignored.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, ctx: &JobContext, params: &JobParams) -> Result<(), SchedulerError>;
}

/// The fixed handler registry, one entry per [`JobKind`].
pub fn default_handlers() -> HashMap<JobKind, Arc<dyn JobHandler>> {
    let mut handlers: HashMap<JobKind, Arc<dyn JobHandler>> = HashMap::new();
    handlers.insert(JobKind::IngestRank, Arc::new(IngestRankJob));
    handlers.insert(JobKind::GenReplies, Arc::new(GenRepliesJob));
    handlers.insert(JobKind::DailyIdeas, Arc::new(DailyIdeasJob));
    handlers
}

// ── Parameter helpers ───────────────────────────────────────────────

fn param_u64(params: &JobParams, key: &str) -> Option<u64> {
    params.get(key).and_then(|v| v.as_u64())
}

fn param_u32(params: &JobParams, key: &str) -> Option<u32> {
    param_u64(params, key).map(|v| v as u32)
}

fn param_usize(params: &JobParams, key: &str) -> Option<usize> {
    param_u64(params, key).map(|v| v as usize)
}

fn param_bool(params: &JobParams, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

/// Resolve the targeting profile for a run: the `profile_id` parameter
/// when present (merged in from the config by the service), else the
/// default profile.
async fn load_profile(
    ctx: &JobContext,
    params: &JobParams,
) -> Result<TargetingProfile, SchedulerError> {
    match param_u64(params, "profile_id") {
        Some(id) => Ok(ctx.store.get_profile(Some(id), true).await?),
        None => Ok(ctx
            .store
            .ensure_default_profile(&ctx.config.targeting)
            .await?),
    }
}

// ── ingest_rank ─────────────────────────────────────────────────────

/// Pull fresh posts, run the ranking cycle, and send this cycle's alert
/// batch (full or fallback).
pub struct IngestRankJob;

#[async_trait]
impl JobHandler for IngestRankJob {
    async fn run(&self, ctx: &JobContext, params: &JobParams) -> Result<(), SchedulerError> {
        let max_x = param_usize(params, "max_x").unwrap_or(30);
        let max_reddit = param_usize(params, "max_reddit_per_sub").unwrap_or(25);
        let recency_minutes =
            param_u32(params, "alert_recency_minutes").unwrap_or(ctx.config.alerts.recency_minutes);
        let top_limit = param_usize(params, "top_limit").unwrap_or(ctx.config.alerts.top_limit);
        let profile = load_profile(ctx, params).await?;

        info!(job = "ingest_rank", profile = %profile.name, "job.start");

        let runs: Vec<SourceRun> = ctx
            .sources
            .iter()
            .map(|source| SourceRun {
                limit: match source.name() {
                    "reddit" => max_reddit,
                    _ => max_x,
                },
                source: source.clone(),
            })
            .collect();
        ingest_cycle(ctx.store.as_ref(), &runs, &profile.keywords).await;

        let trending_hashtags = ctx.hashtags.get().await;
        let now = Utc::now();
        rank_and_mark(
            ctx.store.as_ref(),
            &ctx.config.ranking,
            now,
            &RankOptions {
                recent_minutes: Some(recency_minutes),
                priority_keywords: profile.keywords.clone(),
                priority_watchlist: profile.watchlist.clone(),
                trending_hashtags,
            },
        )
        .await?;

        let batch = select_alerts(
            ctx.store.as_ref(),
            ctx.drafter.as_ref(),
            &ctx.config.alerts.tone_priorities,
            top_limit,
            recency_minutes,
            now,
        )
        .await?;

        let (outcome, alerts) = match batch {
            Some(batch) => {
                let outcome = match batch.kind {
                    AlertKind::Full => "alerts_sent",
                    AlertKind::Fallback => "fallback_alert",
                };
                let alerted = batch.alerted;
                let message = OutboundMessage::new(batch.message, "trending_alert")
                    .with_payload(batch.payload);
                ctx.sender.send(&message).await;
                (outcome, alerted)
            }
            None => ("no_alerts", 0),
        };

        info!(job = "ingest_rank", outcome, alerts, "job.complete");
        Ok(())
    }
}

// ── gen_replies ─────────────────────────────────────────────────────

/// Pre-draft replies for top trending posts that have none yet.
pub struct GenRepliesJob;

#[async_trait]
impl JobHandler for GenRepliesJob {
    async fn run(&self, ctx: &JobContext, params: &JobParams) -> Result<(), SchedulerError> {
        let limit = param_usize(params, "limit").unwrap_or(10);

        info!(job = "gen_replies", "job.start");

        let mut posts = ctx.store.trending_posts().await;
        posts.sort_by(|a, b| {
            b.virality_score
                .partial_cmp(&a.virality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        posts.truncate(limit);

        let mut generated = 0usize;
        for mut post in posts {
            if !post.reply_drafts.is_empty() {
                continue;
            }
            match ctx
                .drafter
                .draft(&post, &ctx.config.alerts.tone_priorities)
                .await
            {
                Ok(drafts) if !drafts.is_empty() => {
                    post.reply_drafts = drafts;
                    ctx.store.put_post(&post).await?;
                    generated += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        platform = %post.platform,
                        post_id = %post.post_id,
                        error = %e,
                        "reply drafting failed"
                    );
                }
            }
        }

        info!(job = "gen_replies", generated, "job.complete");
        Ok(())
    }
}

// ── daily_ideas ─────────────────────────────────────────────────────

/// Generate (once per day) and optionally announce post ideas.
pub struct DailyIdeasJob;

#[async_trait]
impl JobHandler for DailyIdeasJob {
    async fn run(&self, ctx: &JobContext, params: &JobParams) -> Result<(), SchedulerError> {
        let announce = param_bool(params, "announce").unwrap_or(true);
        let profile = load_profile(ctx, params).await?;

        info!(job = "daily_ideas", "job.start");

        let ideas = ensure_today_ideas(ctx.store.as_ref(), ctx.ideas.as_ref(), &profile)
            .await
            .map_err(|e| SchedulerError::Handler(e.to_string()))?;

        let outcome = if announce && !ideas.is_empty() {
            let text = format!("Today's {} post ideas:\n- {}", ideas.len(), ideas.join("\n- "));
            ctx.sender
                .send(&OutboundMessage::new(text, "daily_ideas"))
                .await;
            "sent"
        } else {
            "no_announce"
        };

        info!(job = "daily_ideas", ideas = ideas.len(), outcome, "job.complete");
        Ok(())
    }
}
