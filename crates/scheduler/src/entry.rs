//! Per-config trigger entry.

use chrono::{DateTime, Utc};

use surge_core::JobKind;

/// Live trigger state for one scheduler config.
#[derive(Debug, Clone)]
pub struct JobScheduleEntry {
    pub config_id: u64,
    pub job_kind: JobKind,
    /// Normalized 6-field cron expression (seconds prepended).
    pub cron_expression: String,
    /// Timestamp of the last trigger attempt.
    pub last_triggered: Option<DateTime<Utc>>,
    pub enabled: bool,
}
