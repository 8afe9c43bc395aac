//! Event publishing response types.

use herald_webhook::DispatchSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of publishing an event.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatched {
    /// Number of endpoints the event was dispatched to.
    pub dispatched: usize,
    /// Identifiers of the created delivery records.
    pub delivery_ids: Vec<Uuid>,
}

impl From<DispatchSummary> for Dispatched {
    fn from(summary: DispatchSummary) -> Self {
        Self {
            dispatched: summary.dispatched,
            delivery_ids: summary.deliveries,
        }
    }
}
