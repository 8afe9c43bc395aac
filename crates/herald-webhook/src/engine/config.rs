//! Delivery engine configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default retention window for delivery records: 30 days.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Default interval between retention sweeps: 1 hour.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Configuration of the delivery log maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EngineConfig {
    /// Days delivery records are kept before cleanup removes them
    #[cfg_attr(
        feature = "config",
        arg(long, env = "DELIVERY_RETENTION_DAYS", default_value_t = DEFAULT_RETENTION_DAYS)
    )]
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Seconds between periodic cleanup runs (0 disables the cleanup worker)
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CLEANUP_INTERVAL_SECS", default_value_t = DEFAULT_CLEANUP_INTERVAL_SECS)
    )]
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_cleanup_interval_secs() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl EngineConfig {
    /// Returns the retention window.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * 24 * 60 * 60)
    }

    /// Returns the cleanup interval, or `None` if periodic cleanup is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_secs > 0).then(|| Duration::from_secs(self.cleanup_interval_secs))
    }

    /// Set the retention window in days.
    #[must_use]
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Set the cleanup interval in seconds.
    #[must_use]
    pub fn with_cleanup_interval_secs(mut self, secs: u64) -> Self {
        self.cleanup_interval_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retention(), Duration::from_secs(30 * 86_400));
        assert_eq!(config.cleanup_interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_zero_interval_disables_cleanup() {
        let config = EngineConfig::default().with_cleanup_interval_secs(0);
        assert!(config.cleanup_interval().is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig = serde_json::from_str(r#"{"retention_days":7}"#).unwrap();
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.cleanup_interval_secs, DEFAULT_CLEANUP_INTERVAL_SECS);
    }
}
