use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::entry::TimedEntry;
use crate::error::StoreError;
use crate::stats::{Counters, Stats};

/// Used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

struct StoreInner<V> {
    entries: DashMap<String, TimedEntry<V>>,
    counters: Counters,
    next_generation: AtomicU64,
    runtime: Option<Handle>,
}

impl<V> StoreInner<V> {
    /// Removes `key` if it still belongs to the arming identified by
    /// `generation`. Reached from the timer itself, or from a reader that
    /// found the deadline already passed before the timer got to run.
    fn expire(&self, key: &str, generation: u64) {
        match self
            .entries
            .remove_if(key, |_, entry| entry.generation() == generation)
        {
            Some((_, entry)) => {
                entry.cancel();
                self.counters.record_expired();
                debug!(key, generation, "entry expired");
            }
            None => debug!(key, generation, "entry already superseded"),
        }
    }

    /// Reads a live entry. A due entry is expired on the spot and reads as absent.
    fn lookup<T>(&self, key: &str, read: impl FnOnce(&TimedEntry<V>) -> T) -> Option<T> {
        let generation = {
            let entry = self.entries.get(key)?;
            if !entry.is_due(Instant::now()) {
                return Some(read(entry.value()));
            }
            entry.generation()
        };
        self.expire(key, generation);
        None
    }

    fn purge_due(&self) {
        let now = Instant::now();
        let due: Vec<(String, u64)> = self
            .entries
            .iter()
            .filter(|entry| entry.is_due(now))
            .map(|entry| (entry.key().clone(), entry.generation()))
            .collect();
        for (key, generation) in due {
            self.expire(&key, generation);
        }
    }
}

impl<V> Drop for StoreInner<V> {
    fn drop(&mut self) {
        for entry in self.entries.iter() {
            entry.cancel();
        }
    }
}

/// A thread-safe, timed key-value store that allows expiration of keys.
///
/// Every key carries its own timer, armed on `put` and cancelled on `del` or
/// on a refreshing `put`. When the timer fires the entry is removed and the
/// `expired` counter goes up. Nobody has to poll or sweep. Readers also
/// honour the deadline, so an entry whose timer has not been polled yet
/// still reads as gone once its time is up.
///
/// Cloning gives another handle to the same store. Once the last handle is
/// dropped all pending timers are aborted.
pub struct TimedStore<V> {
    inner: Arc<StoreInner<V>>,
}

impl<V> Clone for TimedStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + Sync + 'static> TimedStore<V> {
    pub fn new() -> Self {
        Self::from_parts(DashMap::new(), None)
    }

    pub fn with_config(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let entries = match config.shard_amount {
            Some(shards) => DashMap::with_shard_amount(shards),
            None => DashMap::new(),
        };
        Ok(Self::from_parts(entries, config.runtime))
    }

    fn from_parts(entries: DashMap<String, TimedEntry<V>>, runtime: Option<Handle>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                entries,
                counters: Counters::default(),
                next_generation: AtomicU64::new(0),
                runtime,
            }),
        }
    }

    /// Inserts `value` under `key`, or replaces the value of a live key, and
    /// (re)arms its timer to fire `ttl` from now. A zero `ttl` expires the
    /// entry at the next timer tick.
    ///
    /// Fails when there is no running runtime to take the timer; in that
    /// case the store is left unchanged.
    pub fn put(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<(), StoreError> {
        let runtime = self.runtime()?;
        let value = Arc::new(value);
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let deadline = now.checked_add(ttl).unwrap_or(now + FAR_FUTURE);

        // The timer is spawned while the shard is locked, so it can't observe
        // the slot before the new generation is in place.
        let previous = match self.inner.entries.entry(key.into()) {
            Entry::Occupied(mut slot) => {
                let timer = self.arm(&runtime, slot.key().clone(), generation, deadline)?;
                let previous = slot.insert(TimedEntry::new(value, generation, deadline, timer));
                previous.cancel();
                trace!(key = %slot.key(), ?ttl, "refreshed entry");
                Some(previous)
            }
            Entry::Vacant(slot) => {
                let timer = self.arm(&runtime, slot.key().clone(), generation, deadline)?;
                trace!(key = %slot.key(), ?ttl, "inserted entry");
                slot.insert(TimedEntry::new(value, generation, deadline, timer));
                self.inner.counters.record_put();
                None
            }
        };
        // Dropped after the shard lock is released; its Drop may call back into the store.
        drop(previous);
        Ok(())
    }

    /// Returns a handle to the value for `key`, counting a hit or a miss.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let value = self.inner.lookup(key, |entry| entry.value_shared());
        self.inner.counters.record_get(value.is_some());
        value
    }

    /// Removes `key` and cancels its timer. Returns whether anything was
    /// removed; absent keys are ignored.
    pub fn del(&self, key: &str) -> bool {
        match self.inner.entries.remove(key) {
            Some((key, entry)) => {
                entry.cancel();
                trace!(%key, "deleted entry");
                true
            }
            None => false,
        }
    }

    /// Like `get` but without touching the hit/miss counters.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lookup(key, |_| ()).is_some()
    }

    /// Time left before `key` expires.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.inner.lookup(key, |entry| entry.remaining())
    }

    /// Drops every entry and cancels every timer. Not counted as expirations.
    pub fn clear(&self) {
        let keys: Vec<String> = self
            .inner
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys {
            self.del(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.purge_due();
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> Stats {
        self.inner.purge_due();
        self.inner.counters.snapshot()
    }

    fn runtime(&self) -> Result<Handle, StoreError> {
        match &self.inner.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| StoreError::NoRuntime),
        }
    }

    /// Must be called with the shard for `key` locked.
    fn arm(
        &self,
        runtime: &Handle,
        key: String,
        generation: u64,
        deadline: Instant,
    ) -> Result<AbortHandle, StoreError> {
        let inner: Weak<StoreInner<V>> = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(&key, generation);
            }
        });
        // A live timer blocks on the locked shard before it can complete, so
        // a finished task here was refused by a runtime that has shut down.
        if task.is_finished() {
            return Err(StoreError::NoRuntime);
        }
        Ok(task.abort_handle())
    }
}

impl<V: Send + Sync + 'static> Default for TimedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for TimedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedStore")
            .field("len", &self.inner.entries.len())
            .field("stats", &self.inner.counters.snapshot())
            .finish()
    }
}
