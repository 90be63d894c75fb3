//! Upstream Fetcher Module
//!
//! The source of truth consulted on a cache miss is supplied by the
//! embedding application through the [`Fetcher`] trait.

use std::sync::Arc;

use async_trait::async_trait;

// == Fetcher ==
/// Loads records from the slower source the cache sits in front of.
///
/// Errors are returned to the cache caller unchanged; the cache never
/// retries and never caches a failure.
#[async_trait]
pub trait Fetcher<K, V>: Send + Sync {
    type Error: Send;

    /// Fetches a single record.
    async fn fetch_one(&self, key: &K) -> Result<V, Self::Error>;

    /// Fetches a batch of records.
    ///
    /// May return fewer values than keys requested; missing records are not
    /// an error. An error means the whole batch failed.
    async fn fetch_many(&self, keys: &[K]) -> Result<Vec<V>, Self::Error>;
}

#[async_trait]
impl<K, V, T> Fetcher<K, V> for Arc<T>
where
    T: Fetcher<K, V> + ?Sized,
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    type Error = T::Error;

    async fn fetch_one(&self, key: &K) -> Result<V, Self::Error> {
        (**self).fetch_one(key).await
    }

    async fn fetch_many(&self, keys: &[K]) -> Result<Vec<V>, Self::Error> {
        (**self).fetch_many(keys).await
    }
}
