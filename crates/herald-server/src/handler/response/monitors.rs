//! Health monitoring response types.

use herald_webhook::EngineHealth;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Engine health response.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Whether the engine accepts new work.
    pub is_healthy: bool,
    /// Number of registered endpoints.
    pub endpoints: usize,
    /// Attempt sequences running or waiting for a retry.
    pub in_flight: usize,
    /// Time of this check.
    pub checked_at: Timestamp,
}

impl From<EngineHealth> for MonitorStatus {
    fn from(health: EngineHealth) -> Self {
        Self {
            is_healthy: !health.shutting_down,
            endpoints: health.endpoints,
            in_flight: health.in_flight,
            checked_at: Timestamp::now(),
        }
    }
}
