use tokio::runtime::Handle;

use crate::error::StoreError;

/// Optional tuning for a [`TimedStore`](crate::TimedStore).
///
/// ```rust,no_run
/// use timed_store::{StoreConfig, TimedStore};
///
/// #[tokio::main]
/// async fn main() {
///     let config = StoreConfig::default().with_shard_amount(16);
///     let store: TimedStore<String> = TimedStore::with_config(config).unwrap();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Number of map shards. `None` lets dashmap pick from the CPU count.
    pub shard_amount: Option<usize>,
    /// Runtime that runs expiration timers. `None` uses whatever runtime
    /// is current when `put` is called.
    pub runtime: Option<Handle>,
}

impl StoreConfig {
    pub fn with_shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = Some(shards);
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        match self.shard_amount {
            Some(n) if n <= 1 || !n.is_power_of_two() => Err(StoreError::InvalidShardAmount(n)),
            _ => Ok(()),
        }
    }
}
