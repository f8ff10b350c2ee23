use std::sync::Arc;

use tokio::task::AbortHandle;
use tokio::time::Instant;

/// A stored value together with the timer that will remove it.
///
/// `generation` identifies which arming of the timer owns the slot; a timer
/// whose generation no longer matches must leave the slot alone.
#[derive(Debug)]
pub(crate) struct TimedEntry<V> {
    value: Arc<V>,
    generation: u64,
    deadline: Instant,
    timer: AbortHandle,
}

impl<V> TimedEntry<V> {
    pub fn new(value: Arc<V>, generation: u64, deadline: Instant, timer: AbortHandle) -> Self {
        Self {
            value,
            generation,
            deadline,
            timer,
        }
    }

    /// Named apart from dashmap's `Ref::value`, which would shadow it.
    pub fn value_shared(&self) -> Arc<V> {
        Arc::clone(&self.value)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline <= now
    }

    pub fn remaining(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel(&self) {
        self.timer.abort();
    }
}
