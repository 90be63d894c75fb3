//! TTL Cache - A generic in-process key/value cache
//!
//! Provides concurrency-safe storage with time-based expiry (eager per-entry
//! timers or lazy checks plus a periodic sweep) and fetch-through loading
//! from an external source.
//!
//! The store, counters and background tasks behind [`Cache`] are internal:
//!
//! ```compile_fail
//! use ttl_cache::cache::ConcurrentStore;
//! ```
//!
//! ```compile_fail
//! use ttl_cache::tasks::SweepControl;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
mod tasks;

pub use cache::{Cache, CacheEntry, CacheStats, ExpiryStrategy};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use fetch::{Fetcher, FetchingCache};
