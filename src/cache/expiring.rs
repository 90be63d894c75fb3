//! Expiring Cache Module
//!
//! Public cache handle combining the store with an expiry strategy.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use crate::cache::{
    deadline_after, CacheEntry, CacheStats, ConcurrentStore, ExpiryStrategy, StatsRecorder,
};
use crate::config::CacheConfig;
use crate::tasks::{schedule_deletion, SweepControl};

// == Cache ==
/// Concurrency-safe key/value cache with time-based expiry.
///
/// Cloning is cheap: clones share the same store, counters and sweep loop.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_cache::Cache;
///
/// # tokio_test::block_on(async {
/// let cache: Cache<u32, String> = Cache::eager();
/// cache.set_with_expiry(1, "x".to_string(), Duration::from_secs(60)).await;
/// assert_eq!(cache.get(&1).await.as_deref(), Some("x"));
/// # });
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    store: Arc<ConcurrentStore<K, V>>,
    stats: Arc<StatsRecorder>,
    sweep: Arc<SweepControl>,
    strategy: ExpiryStrategy,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            stats: Arc::clone(&self.stats),
            sweep: Arc::clone(&self.sweep),
            strategy: self.strategy,
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    pub fn new(strategy: ExpiryStrategy) -> Self {
        Self {
            store: Arc::new(ConcurrentStore::new()),
            stats: Arc::new(StatsRecorder::new()),
            sweep: Arc::new(SweepControl::new()),
            strategy,
        }
    }

    /// Cache that deletes every entry with its own timer.
    pub fn eager() -> Self {
        Self::new(ExpiryStrategy::Eager)
    }

    /// Cache that checks expiry on read and sweeps every `sweep_interval`
    /// once [`start_cleaning`](Self::start_cleaning) is running.
    pub fn lazy(sweep_interval: Duration) -> Self {
        Self::new(ExpiryStrategy::lazy(sweep_interval))
    }

    pub fn from_config(config: &CacheConfig) -> crate::Result<Self> {
        Ok(Self::new(config.expiry_strategy()?))
    }

    pub fn strategy(&self) -> ExpiryStrategy {
        self.strategy
    }

    // == Set ==
    /// Stores a value with no expiry, overwriting any previous entry.
    pub async fn set(&self, key: K, value: V) {
        self.insert(key, value, None).await;
    }

    /// Stores a value that expires after `ttl`, overwriting any previous entry.
    ///
    /// A zero `ttl` stores the value without expiry. Under the eager strategy
    /// a one-shot deletion is scheduled for the deadline.
    pub async fn set_with_expiry(&self, key: K, value: V, ttl: Duration) {
        self.insert(key, value, deadline_after(ttl)).await;
    }

    pub(crate) async fn insert(&self, key: K, value: V, expires_at: Option<Instant>) {
        let generation = self.store.next_generation();
        let entry = CacheEntry::new(value, expires_at, generation);
        self.store.set(key.clone(), entry).await;

        if let Some(deadline) = expires_at {
            self.schedule(key, generation, deadline);
        }
    }

    /// Stores a batch of values that share one deadline.
    pub(crate) async fn insert_many(&self, items: Vec<(K, V)>, expires_at: Option<Instant>) {
        let batch: Vec<(K, CacheEntry<V>)> = items
            .into_iter()
            .map(|(key, value)| {
                let entry = CacheEntry::new(value, expires_at, self.store.next_generation());
                (key, entry)
            })
            .collect();

        let timers: Vec<(K, u64)> = match expires_at {
            Some(_) if self.strategy.is_eager() => batch
                .iter()
                .map(|(key, entry)| (key.clone(), entry.generation()))
                .collect(),
            _ => Vec::new(),
        };

        self.store.set_many(batch).await;

        if let Some(deadline) = expires_at {
            for (key, generation) in timers {
                self.schedule(key, generation, deadline);
            }
        }
    }

    fn schedule(&self, key: K, generation: u64, deadline: Instant) {
        if self.strategy.is_eager() {
            schedule_deletion(
                Arc::clone(&self.store),
                Arc::clone(&self.stats),
                key,
                generation,
                deadline,
            );
        }
    }

    // == Get ==
    /// Returns the value if present and not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.get_entry(key).await.map(CacheEntry::into_value)
    }

    /// Returns the live entry with its expiry metadata.
    pub async fn get_entry(&self, key: &K) -> Option<CacheEntry<V>> {
        match self.store.get(key).await {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                Some(entry)
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if something was removed.
    pub async fn delete(&self, key: &K) -> bool {
        self.store.delete(key).await
    }

    // == Clear ==
    /// Removes every entry. Pending deferred deletions become no-ops.
    pub async fn clear(&self) {
        self.store.clear().await;
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet removed.
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    // == Purge Expired ==
    /// Runs a single sweep now. Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let removed = self.store.purge_expired().await;
        self.stats.record_expirations(removed);
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    pub(crate) fn recorder(&self) -> &StatsRecorder {
        &self.stats
    }

    // == Sweep Control ==
    /// Runs the sweep loop on the current task until
    /// [`stop_cleaning`](Self::stop_cleaning) is called.
    ///
    /// Returns immediately if a loop is already running, the cache uses the
    /// eager strategy, or its sweep interval is zero.
    pub async fn start_cleaning(&self) {
        let Some(interval) = self.checked_sweep_interval("start_cleaning") else {
            return;
        };

        if let Some(run) = self.sweep.begin() {
            run.run(&*self.store, &*self.stats, interval).await;
        }
    }

    /// Runs the sweep loop on a spawned task.
    ///
    /// The loop is marked running before this returns, so a following
    /// [`stop_cleaning`](Self::stop_cleaning) always reaches it. Returns None
    /// when a loop is already running, the cache uses the eager strategy, or
    /// its sweep interval is zero.
    pub fn spawn_cleaning(&self) -> Option<JoinHandle<()>> {
        let interval = self.checked_sweep_interval("spawn_cleaning")?;
        let run = self.sweep.begin()?;
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        Some(tokio::spawn(async move {
            run.run(&*store, &*stats, interval).await;
        }))
    }

    fn checked_sweep_interval(&self, caller: &str) -> Option<Duration> {
        match self.strategy.sweep_interval() {
            None => {
                warn!("{} called on an eager cache; nothing to sweep", caller);
                None
            }
            Some(interval) if interval.is_zero() => {
                warn!("{} called with a zero sweep interval; not sweeping", caller);
                None
            }
            interval => interval,
        }
    }

    /// Signals the sweep loop to exit. A start issued while the previous
    /// loop is still winding down takes over from it.
    pub fn stop_cleaning(&self) {
        self.sweep.stop();
    }

    pub fn is_cleaning(&self) -> bool {
        self.sweep.is_running()
    }
}
