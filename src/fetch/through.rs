//! Fetch-Through Cache Module
//!
//! Read-through lookups and deduplicated batch loading on top of [`Cache`].

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{deadline_after, Cache};
use crate::fetch::Fetcher;

// == Fetching Cache ==
/// A [`Cache`] that loads misses from a [`Fetcher`].
///
/// Fetched values are stored under the key returned by `key_fn`, not under
/// the key that was requested. The two must agree or the lookup will keep
/// missing.
///
/// Concurrent misses for the same key are not coalesced: each caller issues
/// its own upstream fetch and the last write wins.
pub struct FetchingCache<K, V, F, X> {
    cache: Cache<K, V>,
    fetcher: F,
    key_fn: X,
}

impl<K, V, F, X> FetchingCache<K, V, F, X>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: Fetcher<K, V>,
    X: Fn(&V) -> K + Send + Sync,
{
    // == Constructor ==
    pub fn new(cache: Cache<K, V>, fetcher: F, key_fn: X) -> Self {
        Self {
            cache,
            fetcher,
            key_fn,
        }
    }

    /// The underlying cache, for direct reads, writes and sweep control.
    pub fn cache(&self) -> &Cache<K, V> {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    // == Get Or Fetch ==
    /// Returns the cached value, or fetches, stores and returns it on a miss.
    ///
    /// Nothing is cached when the fetch fails; the fetcher's error is
    /// returned as is.
    pub async fn get_or_fetch(&self, key: &K, ttl: Duration) -> Result<V, F::Error> {
        if let Some(value) = self.cache.get(key).await {
            return Ok(value);
        }

        debug!("Cache miss, fetching single record from upstream");
        self.cache.recorder().record_fetch();
        let value = match self.fetcher.fetch_one(key).await {
            Ok(value) => value,
            Err(err) => {
                self.cache.recorder().record_fetch_error();
                warn!("Upstream fetch failed, nothing cached");
                return Err(err);
            }
        };

        let storage_key = (self.key_fn)(&value);
        self.cache
            .set_with_expiry(storage_key, value.clone(), ttl)
            .await;
        Ok(value)
    }

    // == Get Many ==
    /// Returns the live cached values for `keys`, omitting misses.
    pub async fn get_many(&self, keys: &[K]) -> Vec<V> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.cache.get(key).await {
                found.push(value);
            }
        }
        found
    }

    // == Fetch Many ==
    /// Loads every key in `keys` that is not already cached.
    ///
    /// Issues at most one upstream batch call, containing only the missing
    /// keys, and none at all when everything is cached. All returned values
    /// share one deadline computed after the fetch. Keys the fetcher does not
    /// return stay uncached without error.
    pub async fn fetch_many(&self, keys: &[K], ttl: Duration) -> Result<(), F::Error> {
        let mut seen = HashSet::with_capacity(keys.len());
        let mut missing = Vec::new();
        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            if self.cache.get_entry(key).await.is_none() {
                missing.push(key.clone());
            }
        }

        if missing.is_empty() {
            debug!(requested = keys.len(), "Batch fully cached, no upstream call");
            return Ok(());
        }

        debug!(
            requested = keys.len(),
            missing = missing.len(),
            "Fetching missing records from upstream"
        );
        self.cache.recorder().record_fetch();
        let values = match self.fetcher.fetch_many(&missing).await {
            Ok(values) => values,
            Err(err) => {
                self.cache.recorder().record_fetch_error();
                warn!(
                    missing = missing.len(),
                    "Upstream batch fetch failed, nothing cached"
                );
                return Err(err);
            }
        };

        let expires_at = deadline_after(ttl);
        let returned = values.len();
        let items: Vec<(K, V)> = values
            .into_iter()
            .map(|value| ((self.key_fn)(&value), value))
            .collect();
        self.cache.insert_many(items, expires_at).await;

        if returned < missing.len() {
            debug!(
                missing = missing.len(),
                returned,
                "Upstream returned a partial batch"
            );
        }
        Ok(())
    }
}
