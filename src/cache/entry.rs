//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A stored value together with its expiry deadline.
///
/// Entries are never mutated after creation; overwriting a key stores a
/// brand-new entry with a fresh generation stamp.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    /// Deadline after which the entry is expired, None = no expiration
    expires_at: Option<Instant>,
    /// Write stamp, unique per store
    generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry with an absolute deadline.
    pub fn new(value: V, expires_at: Option<Instant>, generation: u64) -> Self {
        Self {
            value,
            expires_at,
            generation,
        }
    }

    /// Creates a new entry that expires `ttl` from now.
    ///
    /// A zero `ttl` means the entry never expires.
    pub fn with_ttl(value: V, ttl: Duration, generation: u64) -> Self {
        Self::new(value, deadline_after(ttl), generation)
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its deadline. Entries without a deadline never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed instant, so a
    /// sweep can judge every entry against one clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the entry has expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

// == Utility Functions ==
/// Computes the deadline `ttl` from now.
///
/// Zero means no deadline, as does a `ttl` too far out for the clock to
/// represent.
pub fn deadline_after(ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        return None;
    }
    Instant::now().checked_add(ttl)
}
