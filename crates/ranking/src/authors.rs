//! Per-author adaptive engagement thresholds.
//!
//! High-baseline authors need proportionally more engagement to count as
//! trending than low-baseline authors, which keeps the trending set from
//! skewing toward already-popular accounts.

use std::collections::HashMap;

use surge_core::Post;

/// Clamp band for the author/global engagement ratio.
#[derive(Debug, Clone, Copy)]
pub struct ScaleBand {
    pub min: f64,
    pub max: f64,
}

/// Historical engagement averages over the current post set.
#[derive(Debug, Default)]
pub struct AuthorStats {
    author_avgs: HashMap<String, f64>,
    pub global_avg: f64,
}

impl AuthorStats {
    /// Average engagement mix (likes + reposts + replies) per author and
    /// across the whole population. Posts without an author count toward
    /// the global average only.
    pub fn build(posts: &[Post]) -> Self {
        let mut totals: HashMap<&str, (u64, u64)> = HashMap::new();
        let mut global_total: u64 = 0;

        for post in posts {
            let engagement = post.engagement_total();
            global_total += engagement;
            if let Some(author) = post.author.as_deref() {
                let bucket = totals.entry(author).or_insert((0, 0));
                bucket.0 += engagement;
                bucket.1 += 1;
            }
        }

        let author_avgs = totals
            .into_iter()
            .map(|(author, (total, count))| (author.to_string(), total as f64 / count as f64))
            .collect();
        let global_avg = if posts.is_empty() {
            0.0
        } else {
            global_total as f64 / posts.len() as f64
        };

        Self {
            author_avgs,
            global_avg,
        }
    }

    pub fn author_avg(&self, author: Option<&str>) -> Option<f64> {
        author.and_then(|a| self.author_avgs.get(a).copied())
    }

    /// Denominator for the author ratio: never below the configured floor
    /// or 1, so sparse datasets don't inflate ratios.
    pub fn global_reference(&self, floor: u64) -> f64 {
        self.global_avg.max(floor as f64).max(1.0)
    }
}

/// Engagement total a post must reach to qualify as trending.
///
/// `ratio = author_avg / global_reference`, clamped to the band; authors
/// without history score ratio 1.0. Pure and I/O-free.
pub fn required_engagement(
    author_avg: Option<f64>,
    global_reference: f64,
    floor: u64,
    band: ScaleBand,
) -> u64 {
    let base_required = floor.max(1) as f64;
    let mut ratio = 1.0;
    if let Some(avg) = author_avg {
        if global_reference > 0.0 {
            ratio = avg / global_reference;
        }
    }
    ratio = ratio.clamp(band.min, band.max);
    ((base_required * ratio).round() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use surge_core::Platform;

    const BAND: ScaleBand = ScaleBand { min: 0.5, max: 2.5 };

    fn post(author: Option<&str>, likes: u64) -> Post {
        Post {
            platform: Platform::X,
            post_id: likes.to_string(),
            author: author.map(String::from),
            url: None,
            text: String::new(),
            created_at: Utc::now(),
            collected_at: Utc::now(),
            like_count: likes,
            reply_count: 0,
            repost_count: 0,
            quote_count: 0,
            view_count: 0,
            virality_score: 0.0,
            velocity_score: 0.0,
            trending: false,
            trending_since: None,
            trending_candidate_since: None,
            last_alerted_at: None,
            last_alerted_virality: None,
            tones: vec![],
            reply_drafts: vec![],
        }
    }

    #[test]
    fn unknown_author_needs_the_base_floor() {
        assert_eq!(required_engagement(None, 20.0, 20, BAND), 20);
    }

    #[test]
    fn high_baseline_author_needs_more() {
        let required = required_engagement(Some(40.0), 20.0, 20, BAND);
        assert_eq!(required, 40);
        assert!(required > required_engagement(Some(10.0), 20.0, 20, BAND));
    }

    #[test]
    fn ratio_clamps_to_band() {
        // 1000/20 = 50x, clamped to 2.5x.
        assert_eq!(required_engagement(Some(1000.0), 20.0, 20, BAND), 50);
        // 1/20 = 0.05x, clamped to 0.5x.
        assert_eq!(required_engagement(Some(1.0), 20.0, 20, BAND), 10);
    }

    #[test]
    fn floor_of_zero_still_requires_one() {
        assert_eq!(required_engagement(None, 1.0, 0, BAND), 1);
        assert_eq!(required_engagement(Some(0.1), 1.0, 0, BAND), 1);
    }

    #[test]
    fn zero_reference_falls_back_to_unit_ratio() {
        assert_eq!(required_engagement(Some(50.0), 0.0, 20, BAND), 20);
    }

    #[test]
    fn stats_over_empty_set() {
        let stats = AuthorStats::build(&[]);
        assert_eq!(stats.global_avg, 0.0);
        assert_eq!(stats.author_avg(Some("a")), None);
        assert_eq!(stats.global_reference(20), 20.0);
    }

    #[test]
    fn stats_average_per_author_and_globally() {
        let posts = vec![
            post(Some("a"), 10),
            post(Some("a"), 30),
            post(Some("b"), 2),
            post(None, 6),
        ];
        let stats = AuthorStats::build(&posts);
        assert_eq!(stats.author_avg(Some("a")), Some(20.0));
        assert_eq!(stats.author_avg(Some("b")), Some(2.0));
        assert_eq!(stats.author_avg(None), None);
        assert_eq!(stats.global_avg, 12.0);
    }

    #[test]
    fn dominating_author_hits_the_upper_clamp() {
        let posts = vec![post(Some("whale"), 10_000), post(Some("minnow"), 1)];
        let stats = AuthorStats::build(&posts);
        let reference = stats.global_reference(20);
        let required = required_engagement(stats.author_avg(Some("whale")), reference, 20, BAND);
        assert_eq!(required, 50); // 20 * 2.5 cap
    }

    #[test]
    fn global_reference_uses_floor_when_avg_is_low() {
        let posts = vec![post(Some("a"), 1)];
        let stats = AuthorStats::build(&posts);
        assert_eq!(stats.global_reference(20), 20.0);
        assert_eq!(stats.global_reference(0), 1.0);
    }
}
