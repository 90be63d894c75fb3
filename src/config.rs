//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{ExpiryStrategy, DEFAULT_SWEEP_INTERVAL};
use crate::error::CacheError;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiry strategy name: "eager" or "lazy"
    pub strategy: String,
    /// Sweep interval in milliseconds (lazy strategy only)
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STRATEGY` - Expiry strategy, "eager" or "lazy" (default: eager)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            strategy: env::var("CACHE_STRATEGY")
                .ok()
                .filter(|v| v.parse::<ExpiryStrategy>().is_ok())
                .unwrap_or(defaults.strategy),
            sweep_interval_ms: env::var("CACHE_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.sweep_interval_ms),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Resolves the configured strategy, carrying the sweep interval into
    /// the lazy variant.
    ///
    /// A lazy strategy with a zero sweep interval is rejected.
    pub fn expiry_strategy(&self) -> crate::Result<ExpiryStrategy> {
        let strategy = self.strategy.parse::<ExpiryStrategy>()?;
        match strategy {
            ExpiryStrategy::Eager => Ok(ExpiryStrategy::Eager),
            ExpiryStrategy::Lazy { .. } if self.sweep_interval_ms == 0 => Err(
                CacheError::InvalidConfig("sweep interval must be greater than zero".to_string()),
            ),
            ExpiryStrategy::Lazy { .. } => Ok(ExpiryStrategy::lazy(self.sweep_interval())),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: ExpiryStrategy::Eager.to_string(),
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
        }
    }
}
