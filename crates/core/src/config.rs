use std::env;

use serde::{Deserialize, Serialize};

use crate::error::SurgeError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

/// Comma-separated env list, trimmed, empties dropped.
fn env_csv(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn env_csv_or(key: &str, default: &[&str]) -> Vec<String> {
    let parsed = env_csv(key);
    if parsed.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ranking: RankingConfig,
    pub alerts: AlertConfig,
    pub ingest: IngestConfig,
    pub ideas: IdeasConfig,
    pub targeting: TargetingConfig,
    pub telegram: TelegramConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            ranking: RankingConfig::from_env(),
            alerts: AlertConfig::from_env(),
            ingest: IngestConfig::from_env(),
            ideas: IdeasConfig::from_env(),
            targeting: TargetingConfig::from_env(),
            telegram: TelegramConfig::from_env(),
        }
    }

    /// Reject configurations that would make scoring or alerting degenerate.
    pub fn validate(&self) -> Result<(), SurgeError> {
        let r = &self.ranking;
        if r.author_scale_min <= 0.0 || r.author_scale_max <= 0.0 {
            return Err(SurgeError::Config(
                "TREND_AUTHOR_SCALE_MIN/MAX must be > 0".to_string(),
            ));
        }
        if r.author_scale_max < r.author_scale_min {
            return Err(SurgeError::Config(
                "TREND_AUTHOR_SCALE_MAX must be >= TREND_AUTHOR_SCALE_MIN".to_string(),
            ));
        }
        if r.profile_match_bonus <= 0.0 {
            return Err(SurgeError::Config("PROFILE_MATCH_BONUS must be > 0".to_string()));
        }
        if r.trending_hashtag_bonus <= 0.0 {
            return Err(SurgeError::Config(
                "TRENDING_HASHTAG_BONUS must be > 0".to_string(),
            ));
        }
        if r.recency_bonus_amount <= 0.0 {
            return Err(SurgeError::Config("RECENCY_BONUS_AMOUNT must be > 0".to_string()));
        }
        if self.alerts.recency_minutes == 0 {
            return Err(SurgeError::Config(
                "ALERT_RECENCY_MINUTES must be positive".to_string(),
            ));
        }
        if self.ideas.hour > 23 {
            return Err(SurgeError::Config("IDEAS_TIME_HOUR must be 0-23".to_string()));
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  ranking:   min_engagement={}, scale_band=[{}, {}], expire_minutes={}",
            self.ranking.min_engagement_mix,
            self.ranking.author_scale_min,
            self.ranking.author_scale_max,
            self.ranking.trend_expire_minutes,
        );
        tracing::info!(
            "  alerts:    recency_minutes={}, top_limit={}",
            self.alerts.recency_minutes,
            self.alerts.top_limit,
        );
        tracing::info!(
            "  ingest:    x={}, reddit={}, stream={}, hashtag_cache={}m",
            self.ingest.x_enabled,
            self.ingest.reddit_enabled,
            self.ingest.stream_enabled,
            self.ingest.hashtag_cache_minutes,
        );
        tracing::info!(
            "  targeting: niche={}, keywords={}, watchlist={}",
            self.targeting.niche.as_deref().unwrap_or("(none)"),
            self.targeting.keywords.len(),
            self.targeting.watchlist.len(),
        );
        tracing::info!("  telegram:  configured={}", self.telegram.is_configured());
    }
}

// ── Ranking / trending heuristics ─────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Minimum engagement mix (likes + reposts + replies) before author scaling.
    pub min_engagement_mix: u64,
    /// Lower clamp of the per-author scale ratio.
    pub author_scale_min: f64,
    /// Upper clamp of the per-author scale ratio.
    pub author_scale_max: f64,
    /// Virality bonus when a keyword matches and the author is watch-listed.
    pub profile_match_bonus: f64,
    /// Virality bonus when the text carries a currently trending hashtag.
    pub trending_hashtag_bonus: f64,
    /// Freshness window for the recency bonus. 0 disables the bonus.
    pub recency_bonus_minutes: u32,
    pub recency_bonus_amount: f64,
    /// Continuous-trending window after which a post is forced back to none.
    pub trend_expire_minutes: u32,
}

impl RankingConfig {
    fn from_env() -> Self {
        Self {
            min_engagement_mix: env_u64("TREND_MIN_ENGAGEMENT", 20),
            author_scale_min: env_f64("TREND_AUTHOR_SCALE_MIN", 0.5),
            author_scale_max: env_f64("TREND_AUTHOR_SCALE_MAX", 2.5),
            profile_match_bonus: env_f64("PROFILE_MATCH_BONUS", 0.1),
            trending_hashtag_bonus: env_f64("TRENDING_HASHTAG_BONUS", 0.08),
            recency_bonus_minutes: env_u32("RECENCY_BONUS_MINUTES", 10),
            recency_bonus_amount: env_f64("RECENCY_BONUS_AMOUNT", 0.05),
            trend_expire_minutes: env_u32("TREND_EXPIRE_MINUTES", 60),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_engagement_mix: 20,
            author_scale_min: 0.5,
            author_scale_max: 2.5,
            profile_match_bonus: 0.1,
            trending_hashtag_bonus: 0.08,
            recency_bonus_minutes: 10,
            recency_bonus_amount: 0.05,
            trend_expire_minutes: 60,
        }
    }
}

// ── Alert selection ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Ranking cutoff window: only posts whose trend origin falls inside
    /// the last N minutes are alertable.
    pub recency_minutes: u32,
    /// How many top conversations one alert cycle considers.
    pub top_limit: usize,
    /// Reply tones requested from the drafter, in priority order.
    pub tone_priorities: Vec<String>,
}

impl AlertConfig {
    fn from_env() -> Self {
        Self {
            recency_minutes: env_u32("ALERT_RECENCY_MINUTES", 30),
            top_limit: env_u32("ALERT_TOP_LIMIT", 10) as usize,
            tone_priorities: env_csv_or(
                "TONE_PRIORITIES",
                &["witty", "helpful", "contrarian", "informative"],
            ),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            recency_minutes: 30,
            top_limit: 10,
            tone_priorities: vec![
                "witty".to_string(),
                "helpful".to_string(),
                "contrarian".to_string(),
                "informative".to_string(),
            ],
        }
    }
}

// ── Ingestion ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub x_enabled: bool,
    pub reddit_enabled: bool,
    pub stream_enabled: bool,
    /// TTL of the trending-hashtag cache.
    pub hashtag_cache_minutes: u32,
}

impl IngestConfig {
    fn from_env() -> Self {
        Self {
            x_enabled: env_bool("X_INGEST_ENABLED", true),
            reddit_enabled: env_bool("REDDIT_INGEST_ENABLED", true),
            stream_enabled: env_bool("X_STREAM_ENABLED", false),
            hashtag_cache_minutes: env_u32("TREND_HASHTAG_CACHE_MINUTES", 10),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            x_enabled: true,
            reddit_enabled: true,
            stream_enabled: false,
            hashtag_cache_minutes: 10,
        }
    }
}

// ── Daily ideas ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeasConfig {
    /// Hour of day (UTC) the daily ideas job is scheduled at.
    pub hour: u32,
}

impl IdeasConfig {
    fn from_env() -> Self {
        Self {
            hour: env_u32("IDEAS_TIME_HOUR", 8),
        }
    }
}

impl Default for IdeasConfig {
    fn default() -> Self {
        Self { hour: 8 }
    }
}

// ── Default targeting profile seed ────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetingConfig {
    pub niche: Option<String>,
    pub keywords: Vec<String>,
    pub watchlist: Vec<String>,
}

impl TargetingConfig {
    fn from_env() -> Self {
        Self {
            niche: env_opt("NICHE"),
            keywords: env_csv("KEYWORDS"),
            watchlist: env_csv("WATCHLIST"),
        }
    }
}

// ── Telegram delivery ─────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    fn from_env() -> Self {
        Self {
            bot_token: env_opt("TELEGRAM_BOT_TOKEN"),
            chat_id: env_opt("TELEGRAM_CHAT_ID"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ranking: RankingConfig::default(),
            alerts: AlertConfig::default(),
            ingest: IngestConfig::default(),
            ideas: IdeasConfig::default(),
            targeting: TargetingConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn inverted_scale_band_rejected() {
        let mut cfg = Config::default();
        cfg.ranking.author_scale_min = 3.0;
        cfg.ranking.author_scale_max = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_alert_recency_rejected() {
        let mut cfg = Config::default();
        cfg.alerts.recency_minutes = 0;
        assert!(cfg.validate().is_err());
    }
}
