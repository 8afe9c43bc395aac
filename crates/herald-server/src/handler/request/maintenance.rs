//! Maintenance request types.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for a manual delivery log cleanup.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    /// Keep records younger than this many days. Uses the configured
    /// retention when omitted.
    #[validate(range(min = 1, max = 36500))]
    pub retention_days: Option<u32>,
}
