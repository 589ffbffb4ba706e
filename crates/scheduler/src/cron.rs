//! Cron normalization, validation, and due-check helpers.

use std::str::FromStr;

use ::cron::Schedule;
use chrono::{DateTime, Utc};

use crate::error::SchedulerError;

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour day-of-month month day-of-week`.
/// Persisted configs use standard 5-field cron: `min hour day-of-month month day-of-week`.
pub(crate) fn normalize_cron(cron_5field: &str) -> String {
    let trimmed = cron_5field.trim();
    let field_count = trimmed.split_whitespace().count();
    if field_count == 5 {
        format!("0 {}", trimmed)
    } else {
        // Already 6-field or non-standard; pass through as-is.
        trimmed.to_string()
    }
}

/// Validate a config-level cron expression: exactly 5 fields, parseable.
///
/// Runs at config-save time so malformed expressions never reach the
/// trigger loop.
pub fn validate_cron(expr: &str) -> Result<Schedule, SchedulerError> {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() != 5 {
        return Err(SchedulerError::InvalidConfig(format!(
            "cron expression '{trimmed}' must have 5 fields (minute hour day month weekday)"
        )));
    }
    Schedule::from_str(&normalize_cron(trimmed)).map_err(|e| {
        SchedulerError::InvalidConfig(format!("invalid cron expression '{trimmed}': {e}"))
    })
}

/// Check if a cron schedule is due at `now`.
///
/// A trigger is due if there is a scheduled tick between `last_run`
/// (exclusive) and `now` (inclusive). If `last_run` is `None`, any tick
/// in the past day counts.
pub(crate) fn is_cron_due(
    schedule: &Schedule,
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
) -> bool {
    let check_from = last_run.unwrap_or(now - chrono::Duration::days(1));

    if let Some(next) = schedule.after(&check_from).next() {
        next <= now
    } else {
        false
    }
}
