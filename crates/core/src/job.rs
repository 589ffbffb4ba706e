use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed set of schedulable job handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    IngestRank,
    GenReplies,
    DailyIdeas,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::IngestRank, JobKind::GenReplies, JobKind::DailyIdeas];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::IngestRank => "ingest_rank",
            JobKind::GenReplies => "gen_replies",
            JobKind::DailyIdeas => "daily_ideas",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest_rank" => Ok(JobKind::IngestRank),
            "gen_replies" => Ok(JobKind::GenReplies),
            "daily_ideas" => Ok(JobKind::DailyIdeas),
            other => Err(format!("unknown job kind '{other}'")),
        }
    }
}

/// Free-form parameter map passed to a job handler.
pub type JobParams = serde_json::Map<String, serde_json::Value>;

/// One row per schedulable job instance. Drives live trigger registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub id: u64,
    pub job_kind: JobKind,
    pub name: Option<String>,
    /// Standard 5-field cron expression, validated before persisting.
    pub cron: String,
    pub enabled: bool,
    pub priority: i32,
    pub concurrency_limit: u32,
    pub lock_timeout_seconds: u32,
    pub parameters: JobParams,
    pub profile_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.job_kind.as_str())
    }
}

/// Field-level changes applied to a [`JobConfig`] by an administrative update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfigUpdate {
    pub job_kind: Option<JobKind>,
    pub name: Option<Option<String>>,
    pub cron: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub concurrency_limit: Option<u32>,
    pub lock_timeout_seconds: Option<u32>,
    pub parameters: Option<JobParams>,
    pub profile_id: Option<Option<u64>>,
}

/// Ephemeral record of one in-flight execution slot for a job config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub id: u64,
    pub config_id: u64,
    pub token: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of one job execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

/// Append-only audit row written after every execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: u64,
    pub job_kind: JobKind,
    pub config_id: u64,
    pub status: RunStatus,
    pub run_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub detail: Option<String>,
    pub correlation_id: String,
}

/// Opaque token threading one job execution's log and audit entries together.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Random token identifying one lease holder.
pub fn new_lease_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Maximum length of a failure detail carried in audit rows and alerts.
pub const DETAIL_MAX_LEN: usize = 400;

/// Trim a failure detail for audit rows and escalation messages.
pub fn truncate_detail(detail: &str) -> String {
    let trimmed = detail.trim();
    if trimmed.chars().count() > DETAIL_MAX_LEN {
        let cut: String = trimmed.chars().take(DETAIL_MAX_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}
