//! Per-cycle trending state machine.
//!
//! Each ranking cycle rescoring the active post set advances every post
//! through `none → candidate → trending`, with `trending → none` only via
//! expiry or disqualification. A post must keep qualifying from the
//! moment it first became a candidate, which makes the lifecycle
//! resistant to single-sample engagement spikes.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use surge_core::config::RankingConfig;
use surge_core::Post;
use surge_ingest::normalize_hashtags;
use surge_store::{Store, StoreError};

use crate::authors::{required_engagement, AuthorStats, ScaleBand};
use crate::score::compute_scores;

/// Inputs that vary per ranking cycle.
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    /// Qualification window in minutes; `None` or 0 disables the cutoff.
    pub recent_minutes: Option<u32>,
    /// Keywords from the targeting profile (priority-match bonus).
    pub priority_keywords: Vec<String>,
    /// Watch-listed author handles (priority-match bonus).
    pub priority_watchlist: Vec<String>,
    /// Currently trending hashtags (trend bonus).
    pub trending_hashtags: Vec<String>,
}

fn normalize_lower(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn matches_priority(post: &Post, keywords: &[String], watchlist: &[String]) -> bool {
    if keywords.is_empty() || watchlist.is_empty() {
        return false;
    }
    let text = post.text.to_lowercase();
    if !keywords.iter().any(|kw| text.contains(kw)) {
        return false;
    }
    let author = post
        .author
        .as_deref()
        .map(|a| a.trim_start_matches('@').to_lowercase())
        .unwrap_or_default();
    !author.is_empty() && watchlist.iter().any(|w| *w == author)
}

fn matches_trending_hashtag(post: &Post, hashtags: &[String]) -> bool {
    if hashtags.is_empty() || post.text.is_empty() {
        return false;
    }
    let text = post.text.to_lowercase();
    hashtags.iter().any(|tag| text.contains(&format!("#{tag}")))
}

/// Run one ranking cycle over the full post set: recompute both scores,
/// apply virality bonuses, and advance the trending lifecycle. Returns
/// the number of posts whose trending status flipped.
pub async fn rank_and_mark(
    store: &dyn Store,
    config: &RankingConfig,
    now: DateTime<Utc>,
    opts: &RankOptions,
) -> Result<usize, StoreError> {
    let cutoff = opts
        .recent_minutes
        .filter(|m| *m > 0)
        .map(|m| now - Duration::minutes(i64::from(m)));
    let keywords = normalize_lower(&opts.priority_keywords);
    let watchlist = normalize_lower(&opts.priority_watchlist);
    let hashtags = normalize_hashtags(&opts.trending_hashtags);
    let expire_window = Duration::minutes(i64::from(config.trend_expire_minutes));
    let band = ScaleBand {
        min: config.author_scale_min,
        max: config.author_scale_max,
    };

    let posts = store.all_posts().await;
    let stats = AuthorStats::build(&posts);
    let global_reference = stats.global_reference(config.min_engagement_mix);

    let mut updated = 0usize;
    for mut post in posts {
        let scores = compute_scores(&post, now);
        let mut virality = scores.virality;

        if matches_priority(&post, &keywords, &watchlist) {
            virality = (virality + config.profile_match_bonus).min(1.0);
        }
        if matches_trending_hashtag(&post, &hashtags) {
            virality = (virality + config.trending_hashtag_bonus).min(1.0);
        }
        if config.recency_bonus_minutes > 0 && config.recency_bonus_amount > 0.0 {
            let window = Duration::minutes(i64::from(config.recency_bonus_minutes));
            if now - post.created_at <= window {
                virality = (virality + config.recency_bonus_amount).min(1.0);
            }
        }

        let was_trending = post.trending;
        let mut since = post.trending_since;
        let mut candidate_since = post.trending_candidate_since;

        // Expiry: continuously trending past the window resets to none.
        if expire_window > Duration::zero() {
            if let Some(ts) = since {
                if now - ts >= expire_window {
                    post.trending = false;
                    post.trending_since = None;
                    since = None;
                }
            }
        }

        let engagement_total = post.engagement_total();
        let required = required_engagement(
            stats.author_avg(post.author.as_deref()),
            global_reference,
            config.min_engagement_mix,
            band,
        );
        let engagement_ok = engagement_total >= required;
        let mut qualifies = engagement_ok;

        if let Some(cutoff) = cutoff {
            if post.created_at < cutoff {
                qualifies = false;
            }
            // A candidacy that started before the window no longer counts.
            if candidate_since.map_or(false, |c| c < cutoff) {
                candidate_since = None;
                post.trending_candidate_since = None;
            }
        }

        if qualifies {
            if candidate_since.is_none() && !post.trending {
                candidate_since = Some(now);
                post.trending_candidate_since = Some(now);
            }
        } else {
            candidate_since = None;
            post.trending_candidate_since = None;
        }

        let mut should_trend =
            (post.trending && since.is_some()) || (candidate_since.is_some() && engagement_ok);

        let trend_origin = since.or(candidate_since);
        if should_trend {
            if let (Some(cutoff), Some(origin)) = (cutoff, trend_origin) {
                if origin < cutoff {
                    should_trend = false;
                }
            }
        }

        post.virality_score = virality;
        post.velocity_score = scores.velocity;

        if should_trend {
            if since.is_none() {
                post.trending_since = Some(trend_origin.unwrap_or(now));
            }
            post.trending_candidate_since = None;
        } else {
            post.trending_since = None;
            if !engagement_ok {
                post.trending_candidate_since = None;
            }
        }

        post.trending = should_trend;
        if post.trending != was_trending {
            updated += 1;
        }
        store.put_post(&post).await?;
    }

    debug!(updated, "ranking cycle complete");
    Ok(updated)
}
