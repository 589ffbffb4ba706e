//! Alert selection over the trending set.
//!
//! One alert batch per cycle: either a full batch of trending posts that
//! haven't been alerted at their current virality, or a lower-urgency
//! monitoring alert for the strongest not-yet-alerted recent post, so
//! every cycle produces a non-empty signal when there is anything to say.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use surge_core::Post;
use surge_ingest::ReplyDrafter;
use surge_store::{Store, StoreError};

/// Virality delta below which a previously alerted post is not re-alerted.
pub const ALERT_DEDUP_EPSILON: f64 = 1e-3;

/// How far back the alert cycle looks for conversations.
const LOOKBACK_HOURS: i64 = 24;

/// How many drafts are shown per post in the alert text.
const DRAFTS_SHOWN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Trending posts with reply drafts.
    Full,
    /// Monitoring signal for the strongest not-yet-alerted post.
    Fallback,
}

/// One outbound alert batch.
#[derive(Debug, Clone)]
pub struct AlertBatch {
    pub kind: AlertKind,
    pub message: String,
    pub payload: serde_json::Value,
    /// Posts stamped as alerted by this batch.
    pub alerted: usize,
}

fn preview(post: &Post) -> String {
    post.url
        .clone()
        .unwrap_or_else(|| post.text.chars().take(90).collect())
        .trim()
        .to_string()
}

fn display_handle(post: &Post) -> Option<String> {
    post.author
        .as_deref()
        .map(|a| a.trim_start_matches('@').to_string())
        .filter(|a| !a.is_empty())
}

/// Whether a post's current virality differs enough from the last alert.
fn virality_changed(post: &Post) -> bool {
    match post.last_alerted_virality {
        None => true,
        Some(last) => (last - post.virality_score).abs() >= ALERT_DEDUP_EPSILON,
    }
}

/// Scan the top conversations and build this cycle's alert batch.
///
/// Stamps `last_alerted_at`/`last_alerted_virality` on every post the
/// batch covers. Returns `None` when there is nothing new to say.
pub async fn select_alerts(
    store: &dyn Store,
    drafter: &dyn ReplyDrafter,
    tones: &[String],
    top_limit: usize,
    recency_minutes: u32,
    now: DateTime<Utc>,
) -> Result<Option<AlertBatch>, StoreError> {
    let cutoff = now - Duration::minutes(i64::from(recency_minutes));
    let recent_cutoff = now - Duration::hours(LOOKBACK_HOURS);
    let posts = store.top_conversations(top_limit, Some(recent_cutoff)).await;

    let fallback_candidate = posts
        .iter()
        .filter(|p| p.last_alerted_at.is_none())
        .max_by_key(|p| p.engagement_total())
        .cloned();

    let mut summary_lines: Vec<String> = Vec::new();
    let mut payload_posts: Vec<serde_json::Value> = Vec::new();

    for post in &posts {
        if !post.trending {
            continue;
        }
        let since = match post.trending_since {
            Some(ts) => ts,
            None => continue,
        };
        if since < cutoff {
            continue;
        }
        if !virality_changed(post) {
            info!(
                platform = %post.platform,
                post_id = %post.post_id,
                virality = post.virality_score,
                "alert.skip_unchanged"
            );
            continue;
        }

        let mut post = post.clone();
        if post.reply_drafts.is_empty() {
            match drafter.draft(&post, tones).await {
                Ok(drafts) if !drafts.is_empty() => {
                    post.reply_drafts = drafts;
                    store.put_post(&post).await?;
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

        let mut header = format!(
            "{} {:.2}",
            post.platform.as_str().to_uppercase(),
            post.virality_score
        );
        if let Some(handle) = display_handle(&post) {
            header = format!("{header} | {handle}");
        }
        summary_lines.push(format!("• {header}"));
        summary_lines.push(format!("  {}", preview(&post)));

        let mut shown = Vec::new();
        for draft in post.reply_drafts.iter().take(DRAFTS_SHOWN) {
            if draft.text.is_empty() {
                continue;
            }
            let tone_prefix = draft
                .tone
                .as_deref()
                .map(|t| format!("[{t}] "))
                .unwrap_or_default();
            summary_lines.push(format!("    - {tone_prefix}{}", draft.text));
            shown.push(json!({ "tone": draft.tone, "reply": draft.text }));
        }

        payload_posts.push(json!({
            "platform": post.platform,
            "post_id": post.post_id,
            "virality": post.virality_score,
            "velocity": post.velocity_score,
            "suggestions": shown,
        }));

        post.last_alerted_at = Some(now);
        post.last_alerted_virality = Some(post.virality_score);
        store.put_post(&post).await?;
    }

    if !payload_posts.is_empty() {
        let alerted = payload_posts.len();
        let header = format!("Engagement suggestions ({}):", now.format("%H:%M"));
        let mut lines = vec![header];
        lines.extend(summary_lines);
        return Ok(Some(AlertBatch {
            kind: AlertKind::Full,
            message: lines.join("\n"),
            payload: json!({ "posts": payload_posts }),
            alerted,
        }));
    }

    if let Some(mut candidate) = fallback_candidate {
        let engagement = candidate.engagement_total();
        let display_name = display_handle(&candidate)
            .map(|h| format!("@{h}"))
            .or_else(|| candidate.author.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let lines = vec![
            format!(
                "Engagement suggestion ({}) – monitoring for traction.",
                now.format("%H:%M")
            ),
            format!("- {display_name}"),
            format!("  {}", preview(&candidate)),
            format!("  {engagement} engagements; watching for lift."),
        ];
        let payload = json!({
            "fallback": true,
            "posts": [{
                "platform": candidate.platform,
                "post_id": candidate.post_id,
                "engagement_total": engagement,
                "fallback": true,
            }],
        });

        candidate.last_alerted_at = Some(now);
        candidate.last_alerted_virality = Some(candidate.virality_score);
        store.put_post(&candidate).await?;

        return Ok(Some(AlertBatch {
            kind: AlertKind::Fallback,
            message: lines.join("\n"),
            payload,
            alerted: 1,
        }));
    }

    info!("alert.no_new_trending");
    Ok(None)
}
