//! # Timed Store
//!
//! An in-memory key-value store where every entry has its own time-to-live.
//!
//! - Concurrent map backed by `DashMap`
//! - One tokio timer per key; expired entries disappear without any sweep
//! - Usage counters for puts, hits, misses and expirations
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use timed_store::TimedStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), timed_store::StoreError> {
//!     let store = TimedStore::new();
//!     store.put("session:42", String::from("alice"), Duration::from_secs(30))?;
//!
//!     if let Some(user) = store.get("session:42") {
//!         println!("user: {user}");
//!     }
//!
//!     store.del("session:42");
//!     println!("{}", store.stats());
//!     Ok(())
//! }
//! ```

mod config;
mod entry;
mod error;
mod stats;
mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use stats::Stats;
pub use store::TimedStore;
