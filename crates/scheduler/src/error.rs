use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] surge_store::StoreError),

    #[error("job failed: {0}")]
    Handler(String),
}
