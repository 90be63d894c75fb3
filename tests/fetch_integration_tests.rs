//! Integration Tests for the fetch-through layer
//!
//! Uses an in-memory user repository as the upstream source and records
//! every call made to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::time::sleep;
use tokio_test::{assert_err, assert_ok};
use ttl_cache::{Cache, Fetcher, FetchingCache};

// == Test Fetcher ==

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    One(u64),
    Many(Vec<u64>),
}

/// Upstream repository holding users 1..=10.
struct UserRepository {
    users: HashMap<u64, User>,
    calls: Mutex<Vec<Call>>,
    failing: AtomicBool,
}

impl UserRepository {
    fn new() -> Self {
        let users = (1..=10)
            .map(|id| {
                let user = User {
                    id,
                    name: format!("user_{}", id),
                };
                (id, user)
            })
            .collect();

        Self {
            users,
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher<u64, User> for UserRepository {
    type Error = anyhow::Error;

    async fn fetch_one(&self, key: &u64) -> Result<User, Self::Error> {
        self.calls.lock().unwrap().push(Call::One(*key));
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("repository unavailable"));
        }
        self.users
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("user {} not found", key))
    }

    async fn fetch_many(&self, keys: &[u64]) -> Result<Vec<User>, Self::Error> {
        self.calls.lock().unwrap().push(Call::Many(keys.to_vec()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("repository unavailable"));
        }
        Ok(keys.iter().filter_map(|k| self.users.get(k).cloned()).collect())
    }
}

// == Helper Functions ==

fn user(id: u64) -> User {
    User {
        id,
        name: format!("user_{}", id),
    }
}

fn user_id(user: &User) -> u64 {
    user.id
}

fn create_cache() -> FetchingCache<u64, User, UserRepository, fn(&User) -> u64> {
    FetchingCache::new(
        Cache::eager(),
        UserRepository::new(),
        user_id as fn(&User) -> u64,
    )
}

const TTL: Duration = Duration::from_secs(60);

// == Get Or Fetch ==

#[tokio::test]
async fn test_get_or_fetch_miss_fetches_once() {
    let cache = create_cache();

    let first = assert_ok!(cache.get_or_fetch(&3, TTL).await);
    let second = assert_ok!(cache.get_or_fetch(&3, TTL).await);

    assert_eq!(first.name, "user_3");
    assert_eq!(second, user(3));
    assert_eq!(cache.fetcher().calls(), vec![Call::One(3)]);
}

#[tokio::test]
async fn test_get_or_fetch_hit_skips_upstream() {
    let cache = create_cache();
    cache.cache().set(4, user(4)).await;

    assert_eq!(assert_ok!(cache.get_or_fetch(&4, TTL).await), user(4));
    assert!(cache.fetcher().calls().is_empty());
}

#[tokio::test]
async fn test_get_or_fetch_error_is_not_cached() {
    let cache = create_cache();
    cache.fetcher().fail(true);

    let err = assert_err!(cache.get_or_fetch(&1, TTL).await);
    assert_eq!(err.to_string(), "repository unavailable");
    assert_eq!(cache.cache().len().await, 0);
    assert_eq!(cache.cache().stats().fetch_errors, 1);

    cache.fetcher().fail(false);
    assert_eq!(assert_ok!(cache.get_or_fetch(&1, TTL).await), user(1));
    assert_eq!(cache.fetcher().calls(), vec![Call::One(1), Call::One(1)]);
}

#[tokio::test]
async fn test_get_or_fetch_missing_record_propagates_error() {
    let cache = create_cache();

    let err = assert_err!(cache.get_or_fetch(&42, TTL).await);
    assert_eq!(err.to_string(), "user 42 not found");
}

#[tokio::test(start_paused = true)]
async fn test_get_or_fetch_refetches_after_expiry() {
    let cache = create_cache();

    assert_ok!(cache.get_or_fetch(&2, Duration::from_millis(10)).await);
    sleep(Duration::from_millis(20)).await;
    assert_eq!(cache.cache().len().await, 0);

    assert_ok!(cache.get_or_fetch(&2, Duration::from_millis(10)).await);
    assert_eq!(cache.fetcher().calls(), vec![Call::One(2), Call::One(2)]);
}

#[tokio::test]
async fn test_get_or_fetch_stores_under_extracted_key() {
    // Extractor disagrees with the lookup key, so the lookup keeps missing
    let cache = FetchingCache::new(Cache::eager(), UserRepository::new(), |u: &User| {
        u.id + 100
    });

    assert_ok!(cache.get_or_fetch(&5, TTL).await);
    assert_ok!(cache.get_or_fetch(&5, TTL).await);

    assert_eq!(cache.cache().get(&105).await, Some(user(5)));
    assert_eq!(cache.cache().get(&5).await, None);
    assert_eq!(cache.fetcher().calls().len(), 2);
}

// == Get Many ==

#[tokio::test]
async fn test_get_many_returns_found_subset() {
    let cache = create_cache();
    cache.cache().set(1, user(1)).await;
    cache.cache().set(3, user(3)).await;

    let found = cache.get_many(&[1, 2, 3, 4]).await;

    assert_eq!(found, vec![user(1), user(3)]);
    assert!(cache.fetcher().calls().is_empty());
}

// == Fetch Many ==

#[tokio::test]
async fn test_fetch_many_only_requests_missing_keys() {
    let cache = create_cache();
    cache.cache().set(1, user(1)).await;
    cache.cache().set(3, user(3)).await;

    assert_ok!(cache.fetch_many(&[1, 2, 3, 4], TTL).await);

    assert_eq!(cache.fetcher().calls(), vec![Call::Many(vec![2, 4])]);
    assert_eq!(cache.cache().get(&2).await, Some(user(2)));
    assert_eq!(cache.cache().get(&4).await, Some(user(4)));
    assert_eq!(cache.cache().stats().fetches, 1);
}

#[tokio::test]
async fn test_fetch_many_shares_one_deadline() {
    let cache = create_cache();

    assert_ok!(cache.fetch_many(&[5, 6, 7], TTL).await);

    let mut expiries = Vec::new();
    for id in [5u64, 6, 7] {
        let entry = cache.cache().get_entry(&id).await.unwrap();
        expiries.push(entry.expires_at().unwrap());
    }
    assert_eq!(expiries.len(), 3);
    assert!(expiries.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_fetch_many_tolerates_partial_results() {
    let cache = create_cache();

    assert_ok!(cache.fetch_many(&[9, 10, 11, 12], TTL).await);

    assert_eq!(cache.cache().len().await, 2);
    assert_eq!(
        cache.get_many(&[9, 10, 11, 12]).await,
        vec![user(9), user(10)]
    );
}

#[tokio::test]
async fn test_fetch_many_failure_caches_nothing() {
    let cache = create_cache();
    cache.fetcher().fail(true);

    let err = assert_err!(cache.fetch_many(&[1, 2], TTL).await);

    assert_eq!(err.to_string(), "repository unavailable");
    assert_eq!(cache.cache().len().await, 0);
    assert_eq!(cache.fetcher().calls(), vec![Call::Many(vec![1, 2])]);
}

#[tokio::test]
async fn test_fetch_many_empty_request() {
    let cache = create_cache();

    assert_ok!(cache.fetch_many(&[], TTL).await);
    assert!(cache.fetcher().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_many_eager_entries_are_deleted_at_deadline() {
    let cache = create_cache();

    assert_ok!(cache.fetch_many(&[1, 2, 3], Duration::from_millis(10)).await);
    assert_eq!(cache.cache().len().await, 3);

    sleep(Duration::from_millis(20)).await;

    assert_eq!(cache.cache().len().await, 0);
    assert_eq!(cache.cache().stats().expirations, 3);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_many_lazy_entries_expire_on_read() {
    let cache = FetchingCache::new(
        Cache::lazy(Duration::from_secs(60)),
        UserRepository::new(),
        user_id,
    );

    assert_ok!(cache.fetch_many(&[1, 2], Duration::from_millis(10)).await);
    sleep(Duration::from_millis(10)).await;

    assert!(cache.get_many(&[1, 2]).await.is_empty());
    assert_eq!(cache.cache().len().await, 2);
}

// == Shared Fetcher ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shared_fetcher_handle() {
    let repository = Arc::new(UserRepository::new());
    let cache = Arc::new(FetchingCache::new(
        Cache::eager(),
        Arc::clone(&repository),
        user_id,
    ));

    let mut handles = Vec::new();
    for id in 1..=4u64 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(
            async move { cache.get_or_fetch(&id, TTL).await },
        ));
    }
    for (handle, id) in handles.into_iter().zip(1..=4u64) {
        let fetched = assert_ok!(assert_ok!(handle.await));
        assert_eq!(fetched, user(id));
    }

    assert_eq!(repository.calls().len(), 4);
    assert_eq!(cache.cache().len().await, 4);
}
