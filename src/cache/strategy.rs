//! Expiry Strategy Module
//!
//! Selects how expired entries leave the store.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CacheError;

/// Sweep interval used when a lazy strategy is named without one.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// == Expiry Strategy ==
/// Policy for removing expired entries.
///
/// Both strategies hide expired entries from readers immediately; they differ
/// only in when the entry stops occupying storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStrategy {
    /// Every write with a TTL schedules its own one-shot deletion.
    Eager,
    /// Expiry is checked on read; a background loop purges the store every
    /// `sweep_interval`.
    Lazy { sweep_interval: Duration },
}

impl ExpiryStrategy {
    pub fn lazy(sweep_interval: Duration) -> Self {
        Self::Lazy { sweep_interval }
    }

    pub fn is_eager(&self) -> bool {
        matches!(self, Self::Eager)
    }

    /// Sweep interval, if this strategy sweeps at all.
    pub fn sweep_interval(&self) -> Option<Duration> {
        match self {
            Self::Eager => None,
            Self::Lazy { sweep_interval } => Some(*sweep_interval),
        }
    }
}

impl Default for ExpiryStrategy {
    fn default() -> Self {
        Self::Eager
    }
}

impl fmt::Display for ExpiryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Lazy { .. } => write!(f, "lazy"),
        }
    }
}

impl FromStr for ExpiryStrategy {
    type Err = CacheError;

    /// Parses `"eager"` or `"lazy"`; lazy gets [`DEFAULT_SWEEP_INTERVAL`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "lazy" => Ok(Self::lazy(DEFAULT_SWEEP_INTERVAL)),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown expiry strategy '{}'",
                other
            ))),
        }
    }
}
