//! Consecutive-failure tracking with throttled escalation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use surge_core::{truncate_detail, JobKind, RunStatus};

/// Consecutive errors before an escalation fires.
const FAILURE_THRESHOLD: u32 = 3;
/// Minimum gap between escalations for the same job kind.
const ALERT_COOLDOWN_MINUTES: i64 = 30;

/// Counts consecutive failures per job kind and decides when to escalate.
///
/// Pure state machine: [`track`](FailureMonitor::track) returns the
/// escalation message when one should be sent, and the caller delivers it.
#[derive(Debug, Default)]
pub struct FailureMonitor {
    counts: HashMap<JobKind, u32>,
    last_alert: HashMap<JobKind, DateTime<Utc>>,
}

impl FailureMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one run outcome. On the threshold-crossing failure (and on
    /// later failures once the cooldown has elapsed) returns the operator
    /// escalation message; success resets the counter.
    pub fn track(
        &mut self,
        kind: JobKind,
        status: RunStatus,
        detail: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        match status {
            RunStatus::Success => {
                self.counts.insert(kind, 0);
                None
            }
            RunStatus::Error => {
                let count = self.counts.entry(kind).or_insert(0);
                *count += 1;
                if *count < FAILURE_THRESHOLD {
                    return None;
                }
                let cooldown = Duration::minutes(ALERT_COOLDOWN_MINUTES);
                if let Some(last) = self.last_alert.get(&kind) {
                    if now - *last < cooldown {
                        return None;
                    }
                }
                self.last_alert.insert(kind, now);
                let mut message = format!("Job '{kind}' has failed repeatedly.");
                if let Some(detail) = detail.filter(|d| !d.trim().is_empty()) {
                    message.push_str(&format!("\nDetail: {}", truncate_detail(detail)));
                }
                Some(message)
            }
        }
    }

    /// Current consecutive-failure count for a job kind.
    pub fn count(&self, kind: JobKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> FailureMonitor {
        FailureMonitor::new()
    }

    #[test]
    fn escalates_exactly_once_at_threshold() {
        let mut m = monitor();
        let now = Utc::now();
        assert!(m.track(JobKind::IngestRank, RunStatus::Error, None, now).is_none());
        assert!(m.track(JobKind::IngestRank, RunStatus::Error, None, now).is_none());
        let alert = m.track(JobKind::IngestRank, RunStatus::Error, Some("boom"), now);
        assert!(alert.unwrap().contains("Detail: boom"));

        // Further failures inside the cooldown stay quiet.
        let soon = now + Duration::minutes(5);
        assert!(m.track(JobKind::IngestRank, RunStatus::Error, None, soon).is_none());
    }

    #[test]
    fn escalates_again_after_cooldown() {
        let mut m = monitor();
        let now = Utc::now();
        for _ in 0..3 {
            m.track(JobKind::GenReplies, RunStatus::Error, None, now);
        }
        let later = now + Duration::minutes(31);
        let alert = m.track(JobKind::GenReplies, RunStatus::Error, None, later);
        assert!(alert.is_some());
    }

    #[test]
    fn success_resets_the_counter() {
        let mut m = monitor();
        let now = Utc::now();
        m.track(JobKind::DailyIdeas, RunStatus::Error, None, now);
        m.track(JobKind::DailyIdeas, RunStatus::Error, None, now);
        m.track(JobKind::DailyIdeas, RunStatus::Success, None, now);
        assert_eq!(m.count(JobKind::DailyIdeas), 0);

        // The streak starts over; two more errors don't escalate.
        assert!(m.track(JobKind::DailyIdeas, RunStatus::Error, None, now).is_none());
        assert!(m.track(JobKind::DailyIdeas, RunStatus::Error, None, now).is_none());
        assert!(m.track(JobKind::DailyIdeas, RunStatus::Error, None, now).is_some());
    }

    #[test]
    fn kinds_are_tracked_independently() {
        let mut m = monitor();
        let now = Utc::now();
        for _ in 0..3 {
            m.track(JobKind::IngestRank, RunStatus::Error, None, now);
        }
        assert_eq!(m.count(JobKind::GenReplies), 0);
        assert!(m.track(JobKind::GenReplies, RunStatus::Error, None, now).is_none());
    }

    #[test]
    fn long_detail_is_truncated() {
        let mut m = monitor();
        let now = Utc::now();
        let detail = "e".repeat(1000);
        m.track(JobKind::IngestRank, RunStatus::Error, None, now);
        m.track(JobKind::IngestRank, RunStatus::Error, None, now);
        let alert = m
            .track(JobKind::IngestRank, RunStatus::Error, Some(&detail), now)
            .unwrap();
        assert!(alert.len() < 500);
        assert!(alert.ends_with("..."));
    }
}
