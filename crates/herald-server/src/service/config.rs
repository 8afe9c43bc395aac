use herald_webhook::EngineConfig;
use herald_webhook::reqwest::ReqwestConfig;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Outbound HTTP client used for deliveries.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub http_client: ReqwestConfig,

    /// Delivery log retention.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ServiceConfig {
    /// Checks values that clap and serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.engine.retention_days == 0 {
            return Err(Error::config("delivery retention must be at least one day"));
        }

        Ok(())
    }
}
