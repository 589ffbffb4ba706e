//! Cron-driven job scheduling with lease-based concurrency control.
//!
//! [`SchedulerService`] owns the trigger registry, the lease manager, and
//! the failure monitor; call [`SchedulerService::tick`] from the worker
//! loop to fire due jobs. Configuration changes go through the service's
//! admin methods so the live trigger set always matches the store.

pub mod cron;
pub mod entry;
pub mod error;
pub mod failure;
pub mod jobs;
pub mod lease;
pub mod service;

pub use entry::JobScheduleEntry;
pub use error::SchedulerError;
pub use failure::FailureMonitor;
pub use jobs::{JobContext, JobHandler};
pub use lease::LeaseLockManager;
pub use service::{draft_config, SchedulerService};
