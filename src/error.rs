use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// There is no tokio runtime to drive the expiration timer.
    #[error("no tokio runtime available to schedule expiration")]
    NoRuntime,
    #[error("shard amount must be a power of two greater than 1, got {0}")]
    InvalidShardAmount(usize),
}
