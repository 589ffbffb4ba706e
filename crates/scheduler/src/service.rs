//! The scheduler service: trigger registry, execution boundary, and
//! config administration.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ::cron::Schedule;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn, Instrument};

use surge_core::{
    new_correlation_id, truncate_detail, JobConfig, JobConfigUpdate, JobKind, JobParams, JobRun,
    RunStatus,
};
use surge_notify::OutboundMessage;
use surge_store::StoreError;

use crate::cron::{is_cron_due, normalize_cron, validate_cron};
use crate::entry::JobScheduleEntry;
use crate::error::SchedulerError;
use crate::failure::FailureMonitor;
use crate::jobs::{default_handlers, JobContext, JobHandler};
use crate::lease::LeaseLockManager;

/// Build a config row with administrative defaults; callers override
/// fields before handing it to [`SchedulerService::create_config`].
pub fn draft_config(job_kind: JobKind, name: Option<&str>, cron: &str) -> JobConfig {
    let now = Utc::now();
    JobConfig {
        id: 0,
        job_kind,
        name: name.map(String::from),
        cron: cron.to_string(),
        enabled: true,
        priority: 5,
        concurrency_limit: 1,
        lock_timeout_seconds: 300,
        parameters: JobParams::new(),
        profile_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Owns scheduling state for all job configs.
///
/// One instance per process; all state (trigger entries, lease manager,
/// failure counters) lives on the service and is passed to handlers via
/// [`JobContext`], never through globals.
pub struct SchedulerService {
    ctx: Arc<JobContext>,
    handlers: HashMap<JobKind, Arc<dyn JobHandler>>,
    leases: LeaseLockManager,
    failures: Mutex<FailureMonitor>,
    entries: Mutex<HashMap<u64, JobScheduleEntry>>,
}

impl SchedulerService {
    pub fn new(ctx: JobContext) -> Self {
        let leases = LeaseLockManager::new(ctx.store.clone());
        Self {
            ctx: Arc::new(ctx),
            handlers: default_handlers(),
            leases,
            failures: Mutex::new(FailureMonitor::new()),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the handler for a job kind (tests and embedders).
    pub fn register_handler(&mut self, kind: JobKind, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn context(&self) -> &Arc<JobContext> {
        &self.ctx
    }

    // ── Trigger reconciliation ────────────────────────────────

    /// Reconcile the live trigger set with persisted configs: add missing
    /// entries, drop stale ones, update changed cron/enabled flags.
    /// `last_triggered` survives updates.
    pub async fn refresh(&self) {
        let configs = self.ctx.store.list_configs().await;
        let mut entries = self.entries.lock().expect("entries lock");

        let current: HashSet<u64> = configs.iter().map(|c| c.id).collect();
        entries.retain(|id, _| current.contains(id));

        for cfg in configs {
            let cron_expression = normalize_cron(&cfg.cron);
            match entries.get_mut(&cfg.id) {
                Some(entry) => {
                    entry.cron_expression = cron_expression;
                    entry.job_kind = cfg.job_kind;
                    entry.enabled = cfg.enabled;
                }
                None => {
                    entries.insert(
                        cfg.id,
                        JobScheduleEntry {
                            config_id: cfg.id,
                            job_kind: cfg.job_kind,
                            cron_expression,
                            last_triggered: None,
                            enabled: cfg.enabled,
                        },
                    );
                }
            }
        }
    }

    /// Config ids whose cron window has arrived.
    pub fn due_configs(&self, now: DateTime<Utc>) -> Vec<u64> {
        let entries = self.entries.lock().expect("entries lock");
        let mut due: Vec<u64> = entries
            .values()
            .filter(|e| e.enabled)
            .filter(|e| match Schedule::from_str(&e.cron_expression) {
                Ok(schedule) => is_cron_due(&schedule, now, e.last_triggered),
                Err(err) => {
                    warn!(
                        config_id = e.config_id,
                        cron = %e.cron_expression,
                        error = %err,
                        "invalid cron expression"
                    );
                    false
                }
            })
            .map(|e| e.config_id)
            .collect();
        due.sort_unstable();
        due
    }

    fn record_trigger(&self, config_id: u64, at: DateTime<Utc>) {
        let mut entries = self.entries.lock().expect("entries lock");
        if let Some(entry) = entries.get_mut(&config_id) {
            entry.last_triggered = Some(at);
        }
    }

    /// One scheduler tick: sync triggers, fire every due config on its own
    /// task so configs never block each other. Returns how many fired.
    pub async fn tick(self: Arc<Self>, now: DateTime<Utc>) -> usize {
        self.refresh().await;
        let due = self.due_configs(now);
        for config_id in &due {
            self.record_trigger(*config_id, now);
            let service = Arc::clone(&self);
            let config_id = *config_id;
            tokio::spawn(async move {
                if let Err(e) = service.execute(config_id).await {
                    error!(config_id, error = %e, "scheduled job failed");
                }
            });
        }
        due.len()
    }

    /// Snapshot of a config's trigger entry (introspection and tests).
    pub fn entry(&self, config_id: u64) -> Option<JobScheduleEntry> {
        self.entries
            .lock()
            .expect("entries lock")
            .get(&config_id)
            .cloned()
    }

    // ── Execution boundary ────────────────────────────────────

    /// Execute one config now: acquire a lease, run the handler, record
    /// exactly one job run, feed the failure monitor, release the lease.
    ///
    /// Handler errors propagate to the caller after recording. A config
    /// at its concurrency limit is skipped silently (info log, no run row).
    pub async fn execute(&self, config_id: u64) -> Result<(), SchedulerError> {
        let config = match self.ctx.store.get_config(config_id).await {
            Some(config) => config,
            None => {
                warn!(config_id, "scheduler.unknown_config");
                return Ok(());
            }
        };
        if !config.enabled {
            return Ok(());
        }
        let handler = match self.handlers.get(&config.job_kind) {
            Some(handler) => handler.clone(),
            None => {
                error!(job_kind = %config.job_kind, config_id, "scheduler.unknown_job");
                return Ok(());
            }
        };

        let token = match self.leases.acquire(&config).await {
            Some(token) => token,
            None => {
                info!(job_kind = %config.job_kind, config_id, "scheduler.lock_skipped");
                return Ok(());
            }
        };

        let correlation_id = new_correlation_id();
        let span = tracing::info_span!(
            "job",
            job = %config.job_kind,
            config_id = config.id,
            correlation_id = %correlation_id,
        );

        // Profile id from the config is a default; explicit parameters win.
        let mut params = config.parameters.clone();
        if let Some(profile_id) = config.profile_id {
            params
                .entry("profile_id".to_string())
                .or_insert_with(|| serde_json::json!(profile_id));
        }

        let started = Instant::now();
        let result = handler.run(&self.ctx, &params).instrument(span).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (status, detail) = match &result {
            Ok(()) => (RunStatus::Success, None),
            Err(e) => (RunStatus::Error, Some(truncate_detail(&e.to_string()))),
        };

        self.ctx
            .store
            .append_job_run(JobRun {
                id: 0,
                job_kind: config.job_kind,
                config_id: config.id,
                status,
                run_at: Utc::now(),
                duration_ms,
                detail: detail.clone(),
                correlation_id,
            })
            .await;

        let escalation = {
            let mut failures = self.failures.lock().expect("failures lock");
            failures.track(config.job_kind, status, detail.as_deref(), Utc::now())
        };
        if let Some(message) = escalation {
            self.ctx
                .sender
                .send(&OutboundMessage::new(message, "job_alert"))
                .await;
        }

        self.leases.release(config.id, &token).await;

        if let Err(e) = &result {
            error!(
                job_kind = %config.job_kind,
                config_id = config.id,
                error = %e,
                "scheduler.job_failed"
            );
        }
        result
    }

    /// Execute a config outside its schedule.
    pub async fn run_now(&self, config_id: u64) -> Result<(), SchedulerError> {
        self.execute(config_id).await
    }

    // ── Config administration ─────────────────────────────────

    async fn validate(&self, config: &JobConfig) -> Result<(), SchedulerError> {
        validate_cron(&config.cron)?;
        if config.concurrency_limit < 1 {
            return Err(SchedulerError::InvalidConfig(
                "concurrency_limit must be >= 1".to_string(),
            ));
        }
        if config.lock_timeout_seconds < 10 {
            return Err(SchedulerError::InvalidConfig(
                "lock_timeout_seconds must be >= 10".to_string(),
            ));
        }
        if !self.handlers.contains_key(&config.job_kind) {
            return Err(SchedulerError::InvalidConfig(format!(
                "no handler registered for job kind '{}'",
                config.job_kind
            )));
        }
        if let Some(profile_id) = config.profile_id {
            self.ctx
                .store
                .get_profile(Some(profile_id), true)
                .await
                .map_err(|_| {
                    SchedulerError::InvalidConfig(format!(
                        "targeting profile {profile_id} not found"
                    ))
                })?;
        }
        Ok(())
    }

    pub async fn create_config(&self, draft: JobConfig) -> Result<JobConfig, SchedulerError> {
        self.validate(&draft).await?;
        let created = self.ctx.store.create_config(draft).await?;
        self.refresh().await;
        info!(config_id = created.id, job_kind = %created.job_kind, "scheduler config created");
        Ok(created)
    }

    pub async fn update_config(
        &self,
        config_id: u64,
        changes: JobConfigUpdate,
    ) -> Result<JobConfig, SchedulerError> {
        let mut config = self
            .ctx
            .store
            .get_config(config_id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("config {config_id}")))?;

        if let Some(job_kind) = changes.job_kind {
            config.job_kind = job_kind;
        }
        if let Some(name) = changes.name {
            config.name = name;
        }
        if let Some(cron) = changes.cron {
            config.cron = cron;
        }
        if let Some(enabled) = changes.enabled {
            config.enabled = enabled;
        }
        if let Some(priority) = changes.priority {
            config.priority = priority;
        }
        if let Some(limit) = changes.concurrency_limit {
            config.concurrency_limit = limit;
        }
        if let Some(timeout) = changes.lock_timeout_seconds {
            config.lock_timeout_seconds = timeout;
        }
        if let Some(parameters) = changes.parameters {
            config.parameters = parameters;
        }
        if let Some(profile_id) = changes.profile_id {
            config.profile_id = profile_id;
        }

        self.validate(&config).await?;
        let updated = self.ctx.store.update_config(config).await?;
        self.refresh().await;
        Ok(updated)
    }

    pub async fn delete_config(&self, config_id: u64) -> bool {
        let removed = self.ctx.store.delete_config(config_id).await;
        if removed {
            self.refresh().await;
        }
        removed
    }

    /// Pause (`false`) or resume (`true`) a config's trigger.
    pub async fn set_enabled(
        &self,
        config_id: u64,
        enabled: bool,
    ) -> Result<JobConfig, SchedulerError> {
        self.update_config(
            config_id,
            JobConfigUpdate {
                enabled: Some(enabled),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn list_configs(&self) -> Vec<JobConfig> {
        self.ctx.store.list_configs().await
    }

    /// Seed the default job set on first start. Idempotent.
    pub async fn ensure_default_configs(&self) -> Result<(), SchedulerError> {
        if !self.ctx.store.list_configs().await.is_empty() {
            return Ok(());
        }
        let profile = self
            .ctx
            .store
            .ensure_default_profile(&self.ctx.config.targeting)
            .await?;

        let ideas_cron = format!("0 {} * * *", self.ctx.config.ideas.hour);
        let defaults = [
            (
                JobKind::IngestRank,
                "ingest + rank",
                "*/30 * * * *".to_string(),
                serde_json::json!({ "max_x": 30 }),
            ),
            (
                JobKind::GenReplies,
                "generate trending replies",
                "*/15 * * * *".to_string(),
                serde_json::json!({ "limit": 10 }),
            ),
            (
                JobKind::DailyIdeas,
                "daily ideas",
                ideas_cron,
                serde_json::json!({ "announce": true }),
            ),
        ];

        for (kind, name, cron, params) in defaults {
            let mut draft = draft_config(kind, Some(name), &cron);
            draft.profile_id = Some(profile.id);
            draft.parameters = params.as_object().cloned().unwrap_or_default();
            self.ctx.store.create_config(draft).await?;
        }
        self.refresh().await;
        info!("seeded default scheduler configs");
        Ok(())
    }
}
