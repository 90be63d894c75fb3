//! Cache Store Module
//!
//! Thread-safe key/entry map guarded by a single readers-writer lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Concurrent Store ==
/// Generic key/entry storage shared between callers and background tasks.
///
/// Reads run concurrently with other reads; every mutation takes the write
/// lock for the whole store. Expired entries stay here until something
/// removes them, so [`len`](Self::len) reports raw occupancy.
#[derive(Debug)]
pub struct ConcurrentStore<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    generation: AtomicU64,
}

impl<K, V> Default for ConcurrentStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }
}

impl<K, V> ConcurrentStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Generation ==
    /// Returns a fresh write stamp, strictly greater than every earlier one.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    // == Set ==
    /// Stores an entry, replacing whatever the key held before.
    pub async fn set(&self, key: K, entry: CacheEntry<V>) {
        self.entries.write().await.insert(key, entry);
    }

    /// Stores a batch of entries under one write lock.
    pub async fn set_many<I>(&self, batch: I)
    where
        I: IntoIterator<Item = (K, CacheEntry<V>)>,
    {
        let mut entries = self.entries.write().await;
        entries.extend(batch);
    }

    // == Get ==
    /// Returns a copy of the stored entry, expired or not.
    pub async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.read().await.get(key).cloned()
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if something was removed.
    pub async fn delete(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Removes the entry only if it still carries `generation`.
    ///
    /// Used by deferred deletions so a timer never removes a newer write.
    pub async fn delete_if_generation(&self, key: &K, generation: u64) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.generation() == generation => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    // == Clear ==
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    // == Purge Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the current number of stored entries, including expired ones
    /// not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
