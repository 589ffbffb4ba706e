//! Pure scoring engine: engagement counters + elapsed time → normalized
//! (virality, velocity) in [0, 1]. No side effects, never fails.

use chrono::{DateTime, Utc};

use surge_core::Post;

/// Empirical normalization cap dividing raw log-scores into [0, 1].
pub const SCORE_CAP: f64 = 10.0;

/// Scores computed together for one post.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Age-invariant measure of network-effect engagement.
    pub virality: f64,
    /// Age-decayed measure of engagement momentum.
    pub velocity: f64,
}

fn ln1p(count: u64) -> f64 {
    (count as f64).ln_1p()
}

/// Decay newer content less, older content more: 0h → 1.0, 24h → 0.5,
/// 72h → 0.25. Ages before `created_at` clamp to zero.
pub fn time_decay(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - created_at).num_milliseconds().max(0) as f64 / 3_600_000.0;
    1.0 / (1.0 + age_hours / 24.0)
}

/// Score raw counters at a given age.
pub fn score_metrics(
    likes: u64,
    replies: u64,
    reposts: u64,
    quotes: u64,
    views: u64,
    decay: f64,
) -> Scores {
    // Velocity: log-scaled engagement, time-decayed.
    let base = 0.5 * ln1p(likes)
        + 0.8 * ln1p(reposts + quotes)
        + 0.7 * ln1p(replies)
        + 0.3 * ln1p(views);
    let velocity = (base * decay / SCORE_CAP).min(1.0);

    // Virality emphasizes network effects (reposts/quotes) and replies,
    // and is deliberately not decayed: spread potential is independent of
    // recency.
    let virality = (0.4 * ln1p(likes)
        + 1.0 * ln1p(reposts + quotes)
        + 0.9 * ln1p(replies)
        + 0.2 * ln1p(views))
        / SCORE_CAP;
    let virality = virality.min(1.0);

    Scores { virality, velocity }
}

/// Score one post against the current wall clock.
pub fn compute_scores(post: &Post, now: DateTime<Utc>) -> Scores {
    score_metrics(
        post.like_count,
        post.reply_count,
        post.repost_count,
        post.quote_count,
        post.view_count,
        time_decay(post.created_at, now),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at_age(hours: i64) -> f64 {
        let now = Utc::now();
        time_decay(now - Duration::hours(hours), now)
    }

    #[test]
    fn decay_halves_at_one_day() {
        assert!((at_age(0) - 1.0).abs() < 1e-6);
        assert!((at_age(24) - 0.5).abs() < 1e-6);
        assert!((at_age(72) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn future_created_at_clamps_to_no_decay() {
        let now = Utc::now();
        assert_eq!(time_decay(now + Duration::hours(5), now), 1.0);
    }

    #[test]
    fn zero_metrics_zero_scores() {
        let scores = score_metrics(0, 0, 0, 0, 0, 1.0);
        assert_eq!(scores.virality, 0.0);
        assert_eq!(scores.velocity, 0.0);
    }

    #[test]
    fn virality_is_age_invariant_velocity_is_not() {
        let fresh = score_metrics(120, 45, 35, 10, 10_000, 1.0);
        let stale = score_metrics(120, 45, 35, 10, 10_000, 1.0 / (1.0 + 48.0 / 24.0));
        assert_eq!(fresh.virality, stale.virality);
        assert!(stale.velocity < fresh.velocity);
    }

    #[test]
    fn velocity_strictly_decreases_with_age() {
        let mut last = f64::INFINITY;
        for hours in [0, 6, 24, 48, 96, 240] {
            let decay = 1.0 / (1.0 + hours as f64 / 24.0);
            let scores = score_metrics(50, 10, 5, 2, 2_000, decay);
            assert!(scores.velocity < last);
            last = scores.velocity;
        }
    }

    #[test]
    fn scores_are_capped_at_one() {
        let scores = score_metrics(
            1_000_000, 1_000_000, 1_000_000, 1_000_000, 100_000_000, 1.0,
        );
        assert_eq!(scores.virality, 1.0);
        assert_eq!(scores.velocity, 1.0);
    }

    #[test]
    fn reposts_outweigh_likes_for_virality() {
        let liked = score_metrics(100, 0, 0, 0, 0, 1.0);
        let reposted = score_metrics(0, 0, 100, 0, 0, 1.0);
        assert!(reposted.virality > liked.virality);
    }
}
