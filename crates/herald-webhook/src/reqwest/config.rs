//! Transport settings shared by every delivery.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::engine::MAX_RESPONSE_BODY_CHARS;

/// Default upper bound of a single attempt, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of response body bytes read before the rest is dropped.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = MAX_RESPONSE_BODY_CHARS * 4;

/// Outbound transport settings.
///
/// Every endpoint carries its own attempt timeout (1 to 300 seconds).
/// `http_timeout` caps it process-wide: an attempt is aborted after the
/// shorter of the two. Zero removes the cap, leaving endpoint timeouts as
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Upper bound of any delivery attempt in seconds; 0 disables the cap
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// User-Agent sent with every delivery
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Response body bytes kept per attempt; the rest is not read
    #[cfg_attr(
        feature = "config",
        arg(
            long = "http-max-response-bytes",
            env = "HTTP_MAX_RESPONSE_BYTES",
            default_value_t = DEFAULT_MAX_RESPONSE_BYTES
        )
    )]
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_http_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            http_timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl ReqwestConfig {
    /// Sets the attempt timeout cap in seconds.
    #[must_use]
    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        self.http_timeout = secs;
        self
    }

    /// Sets the User-Agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets how many response body bytes are read per attempt.
    #[must_use]
    pub fn with_max_response_bytes(mut self, bytes: usize) -> Self {
        self.max_response_bytes = bytes;
        self
    }

    /// Returns the attempt timeout cap, if any.
    pub fn timeout_ceiling(&self) -> Option<Duration> {
        (self.http_timeout > 0).then(|| Duration::from_secs(self.http_timeout))
    }

    /// Returns the timeout applied to an attempt whose endpoint asks for `requested`.
    pub fn attempt_timeout(&self, requested: Duration) -> Duration {
        self.timeout_ceiling()
            .map_or(requested, |ceiling| requested.min(ceiling))
    }

    /// Returns the configured User-Agent, or `herald-webhook/<version>`.
    pub fn resolved_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("herald-webhook/{}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReqwestConfig::default();
        assert_eq!(config.timeout_ceiling(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_response_bytes, 20_000);
        assert!(config.resolved_user_agent().starts_with("herald-webhook/"));
    }

    #[test]
    fn ceiling_caps_long_endpoint_timeouts() {
        let config = ReqwestConfig::default().with_http_timeout(60);

        assert_eq!(
            config.attempt_timeout(Duration::from_secs(300)),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.attempt_timeout(Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn zero_disables_the_ceiling() {
        let config = ReqwestConfig::default().with_http_timeout(0);

        assert!(config.timeout_ceiling().is_none());
        assert_eq!(
            config.attempt_timeout(Duration::from_secs(300)),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ReqwestConfig = serde_json::from_str(r#"{"user_agent": "hooks/2"}"#).unwrap();
        assert_eq!(config.http_timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_response_bytes, DEFAULT_MAX_RESPONSE_BYTES);
        assert_eq!(config.resolved_user_agent(), "hooks/2");
    }
}
