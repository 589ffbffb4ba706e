use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source platform a post was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    X,
    Reddit,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::X => "x",
            Platform::Reddit => "reddit",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" | "twitter" => Ok(Platform::X),
            "reddit" => Ok(Platform::Reddit),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Unique key of a post: one row per (platform, external post id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostKey {
    pub platform: Platform,
    pub post_id: String,
}

impl PostKey {
    pub fn new(platform: Platform, post_id: impl Into<String>) -> Self {
        Self {
            platform,
            post_id: post_id.into(),
        }
    }
}

impl std::fmt::Display for PostKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.post_id)
    }
}

/// A suggested reply for an alerted post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyDraft {
    pub tone: Option<String>,
    pub text: String,
}

/// One observed social item with scoring and trending state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub platform: Platform,
    pub post_id: String,
    /// Author handle, stored without a leading `@`.
    pub author: Option<String>,
    pub url: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,

    pub like_count: u64,
    pub reply_count: u64,
    pub repost_count: u64,
    pub quote_count: u64,
    pub view_count: u64,

    pub virality_score: f64,
    pub velocity_score: f64,
    /// `trending_since` is Some iff `trending` is true.
    pub trending: bool,
    pub trending_since: Option<DateTime<Utc>>,
    pub trending_candidate_since: Option<DateTime<Utc>>,

    pub last_alerted_at: Option<DateTime<Utc>>,
    pub last_alerted_virality: Option<f64>,

    pub tones: Vec<String>,
    pub reply_drafts: Vec<ReplyDraft>,
}

impl Post {
    pub fn key(&self) -> PostKey {
        PostKey::new(self.platform, self.post_id.clone())
    }

    /// Raw engagement mix used for trend qualification: likes + reposts + replies.
    pub fn engagement_total(&self) -> u64 {
        self.like_count + self.repost_count + self.reply_count
    }
}

/// Normalized item emitted by an ingestion source.
///
/// Counters default to zero; a `None` counter on re-ingestion means
/// "unknown, keep the stored value".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub platform: Platform,
    pub post_id: String,
    pub author: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub like_count: Option<u64>,
    pub reply_count: Option<u64>,
    pub repost_count: Option<u64>,
    pub quote_count: Option<u64>,
    pub view_count: Option<u64>,
}

impl NormalizedPost {
    pub fn new(platform: Platform, post_id: impl Into<String>) -> Self {
        Self {
            platform,
            post_id: post_id.into(),
            author: None,
            url: None,
            text: None,
            created_at: None,
            like_count: None,
            reply_count: None,
            repost_count: None,
            quote_count: None,
            view_count: None,
        }
    }

    /// Author handle with any leading `@` stripped; empty handles become None.
    pub fn clean_author(&self) -> Option<String> {
        self.author
            .as_deref()
            .map(|a| a.trim_start_matches('@').to_string())
            .filter(|a| !a.is_empty())
    }
}

/// Read-only view of a post exposed to collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct PostProjection {
    pub platform: Platform,
    pub post_id: String,
    pub author: Option<String>,
    pub text: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    pub reply_count: u64,
    pub repost_count: u64,
    pub quote_count: u64,
    pub view_count: u64,
    pub virality_score: f64,
    pub velocity_score: f64,
    pub trending: bool,
    pub reply_drafts: Vec<ReplyDraft>,
}

impl From<&Post> for PostProjection {
    fn from(p: &Post) -> Self {
        Self {
            platform: p.platform,
            post_id: p.post_id.clone(),
            author: p.author.clone(),
            text: p.text.clone(),
            url: p.url.clone(),
            created_at: p.created_at,
            like_count: p.like_count,
            reply_count: p.reply_count,
            repost_count: p.repost_count,
            quote_count: p.quote_count,
            view_count: p.view_count,
            virality_score: p.virality_score,
            velocity_score: p.velocity_score,
            trending: p.trending,
            reply_drafts: p.reply_drafts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trip() {
        assert_eq!("x".parse::<Platform>().unwrap(), Platform::X);
        assert_eq!("Reddit".parse::<Platform>().unwrap(), Platform::Reddit);
        assert!("mastodon".parse::<Platform>().is_err());
        assert_eq!(Platform::X.to_string(), "x");
    }

    #[test]
    fn projection_carries_scores_and_drafts() {
        let now = chrono::Utc::now();
        let post = Post {
            platform: Platform::Reddit,
            post_id: "r9".to_string(),
            author: Some("op".to_string()),
            url: Some("https://example.com/r9".to_string()),
            text: "thread".to_string(),
            created_at: now,
            collected_at: now,
            like_count: 7,
            reply_count: 2,
            repost_count: 1,
            quote_count: 0,
            view_count: 90,
            virality_score: 0.4,
            velocity_score: 0.3,
            trending: true,
            trending_since: Some(now),
            trending_candidate_since: None,
            last_alerted_at: None,
            last_alerted_virality: None,
            tones: vec![],
            reply_drafts: vec![ReplyDraft {
                tone: None,
                text: "nice".to_string(),
            }],
        };

        let projection = PostProjection::from(&post);
        assert_eq!(projection.platform, Platform::Reddit);
        assert_eq!(projection.virality_score, 0.4);
        assert!(projection.trending);
        assert_eq!(projection.reply_drafts.len(), 1);
    }

    #[test]
    fn clean_author_strips_at_and_empties() {
        let mut item = NormalizedPost::new(Platform::X, "1");
        item.author = Some("@builder".to_string());
        assert_eq!(item.clean_author().as_deref(), Some("builder"));

        item.author = Some("@".to_string());
        assert_eq!(item.clean_author(), None);

        item.author = None;
        assert_eq!(item.clean_author(), None);
    }
}
