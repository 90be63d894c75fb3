//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and pluggable eviction.

mod entry;
mod expiring;
mod stats;
mod store;
mod strategy;


// Re-export public types
pub use entry::CacheEntry;
pub use expiring::Cache;
pub use stats::CacheStats;
pub use strategy::{ExpiryStrategy, DEFAULT_SWEEP_INTERVAL};

pub(crate) use entry::deadline_after;
pub(crate) use stats::StatsRecorder;
pub(crate) use store::ConcurrentStore;
