use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the store's usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// First-time insertions. Refreshing a live key does not count.
    pub puts: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    /// Entries removed by their own timer. Explicit deletes do not count.
    pub expired: u64,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "puts={} hits={} misses={} expired={}",
            self.puts, self.get_hits, self.get_misses, self.expired
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    puts: AtomicU64,
    get_hits: AtomicU64,
    get_misses: AtomicU64,
    expired: AtomicU64,
}

impl Counters {
    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_get(&self, hit: bool) {
        let counter = if hit { &self.get_hits } else { &self.get_misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            puts: self.puts.load(Ordering::Relaxed),
            get_hits: self.get_hits.load(Ordering::Relaxed),
            get_misses: self.get_misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}
