//! surge-worker — runs the job scheduler loop.
//!
//! Builds the store, notification channels, and collaborator handles,
//! seeds the default job set, then ticks the scheduler until a shutdown
//! signal arrives. In-flight leases are left to expire naturally.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info, warn};

use surge_core::config::load_dotenv;
use surge_core::Config;
use surge_ingest::{CachedHashtags, NoDrafter, NoIdeaGenerator, StaticHashtags};
use surge_notify::{AlertSender, LogNotifier, Notifier, TelegramNotifier, WebhookNotifier};
use surge_scheduler::{JobContext, SchedulerService};
use surge_store::{MemoryStore, Store};

// ── CLI ─────────────────────────────────────────────────────────────

/// Surge worker — cron-driven scoring, trending, and alerting jobs.
#[derive(Parser, Debug)]
#[command(name = "surge-worker", version, about)]
struct Cli {
    /// Scheduler tick interval in seconds.
    #[arg(long, env = "SURGE_TICK_INTERVAL", default_value_t = 60)]
    tick_interval: u64,

    /// Skip seeding the default job configs on startup.
    #[arg(long, env = "SURGE_SKIP_DEFAULT_JOBS", default_value_t = false)]
    skip_default_jobs: bool,

    /// Optional webhook URL to deliver alerts to alongside Telegram.
    #[arg(long, env = "ALERT_WEBHOOK_URL")]
    webhook_url: Option<String>,
}

fn build_channels(config: &Config, webhook_url: Option<&str>) -> Vec<Box<dyn Notifier>> {
    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

    match TelegramNotifier::from_config(&config.telegram) {
        Ok(telegram) => channels.push(Box::new(telegram)),
        Err(e) => info!(reason = %e, "telegram channel not configured"),
    }
    if let Some(url) = webhook_url {
        match WebhookNotifier::new(url.to_string()) {
            Ok(webhook) => channels.push(Box::new(webhook)),
            Err(e) => warn!(error = %e, "webhook channel rejected"),
        }
    }
    if channels.is_empty() {
        info!("no delivery channels configured; alerts go to the log");
        channels.push(Box::new(LogNotifier));
    }
    channels
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.validate()?;
    config.log_summary();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let sender = Arc::new(AlertSender::new(
        build_channels(&config, cli.webhook_url.as_deref()),
        store.clone(),
    ));
    let hashtags = Arc::new(CachedHashtags::new(
        Arc::new(StaticHashtags::default()),
        Duration::from_secs(u64::from(config.ingest.hashtag_cache_minutes) * 60),
    ));

    if config.ingest.stream_enabled {
        warn!("X_STREAM_ENABLED is set but no stream client is wired into this worker");
    }

    let ctx = JobContext {
        store: store.clone(),
        sender,
        drafter: Arc::new(NoDrafter),
        ideas: Arc::new(NoIdeaGenerator),
        hashtags,
        sources: Vec::new(),
        config,
    };
    let service = Arc::new(SchedulerService::new(ctx));

    if !cli.skip_default_jobs {
        service.ensure_default_configs().await?;
    }
    service.refresh().await;
    info!(
        configs = service.list_configs().await.len(),
        tick_interval = cli.tick_interval,
        "worker scheduler started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(cli.tick_interval.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let fired = service.clone().tick(Utc::now()).await;
                if fired > 0 {
                    debug!(fired, "scheduler tick");
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for shutdown signal");
                }
                info!("shutdown signal received; stopping trigger loop");
                break;
            }
        }
    }

    info!("surge-worker exited cleanly");
    Ok(())
}
