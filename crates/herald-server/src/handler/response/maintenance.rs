//! Maintenance response types.

use serde::{Deserialize, Serialize};

/// Outcome of a delivery log cleanup.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    /// Number of delivery records removed.
    pub deleted: u64,
}
