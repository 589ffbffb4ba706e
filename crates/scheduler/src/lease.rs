//! Time-leased, count-limited execution slots per job config.
//!
//! Advisory locking, not strict mutual exclusion: a lease that outlives
//! its holder (crash, hang) is reclaimed purely by time, so a second
//! instance may start while a stuck first instance is still running past
//! its lease. That overlap is an accepted property of the design — stuck
//! jobs are timed out, not detected.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use surge_core::JobConfig;
use surge_store::Store;

/// Floor applied to a config's `concurrency_limit`.
const MIN_CONCURRENCY: u32 = 1;
/// Floor applied to a config's `lock_timeout_seconds`.
const MIN_LOCK_TIMEOUT_SECS: u32 = 10;

/// Grants and revokes execution leases backed by the store.
pub struct LeaseLockManager {
    store: Arc<dyn Store>,
}

impl LeaseLockManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Try to acquire one slot for this config. `None` means the config is
    /// at its concurrency limit; the caller must skip this run, not block.
    ///
    /// The store performs purge + count + insert as one transaction, so
    /// concurrent acquires for the same config serialize correctly.
    pub async fn acquire(&self, config: &JobConfig) -> Option<String> {
        let limit = config.concurrency_limit.max(MIN_CONCURRENCY);
        let ttl = config.lock_timeout_seconds.max(MIN_LOCK_TIMEOUT_SECS);
        let lease = self
            .store
            .acquire_lease(config.id, limit, ttl, Utc::now())
            .await?;
        debug!(
            config_id = config.id,
            token = %lease.token,
            expires_at = %lease.expires_at,
            "lease acquired"
        );
        Some(lease.token)
    }

    /// Delete the lease matching both fields; a no-op when it has already
    /// expired and been purged.
    pub async fn release(&self, config_id: u64, token: &str) {
        let released = self.store.release_lease(config_id, token).await;
        debug!(config_id, released, "lease released");
    }
}
