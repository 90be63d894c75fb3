//! Deferred Deletion Task
//!
//! One-shot task behind the eager expiry strategy: it waits for an entry's
//! deadline and then removes that exact entry from the store.

use std::hash::Hash;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{ConcurrentStore, StatsRecorder};

/// Spawns a task that deletes `key` at `deadline` if it still holds the
/// entry stamped with `generation`.
///
/// Overwriting or deleting the key before the deadline turns the task into a
/// no-op; it never removes a value written after it was scheduled.
pub fn schedule_deletion<K, V>(
    store: Arc<ConcurrentStore<K, V>>,
    stats: Arc<StatsRecorder>,
    key: K,
    generation: u64,
    deadline: Instant,
) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;

        if store.delete_if_generation(&key, generation).await {
            stats.record_expirations(1);
            debug!(generation, "Deferred deletion removed expired entry");
        } else {
            debug!(generation, "Deferred deletion skipped, entry was replaced");
        }
    })
}
