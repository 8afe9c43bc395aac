//! Envelope sent to webhook endpoints.

use jiff::{Timestamp, Unit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use crate::types::{Endpoint, EventId, EventType};

/// The JSON document delivered to an endpoint.
///
/// The envelope is built once per delivery and stored on the delivery record,
/// so every attempt (including manual retries) sends identical bytes with the
/// same `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event identifier receivers deduplicate on.
    pub id: EventId,
    /// Event type name.
    pub event: EventType,
    /// Time the delivery was created, in UTC.
    pub timestamp: Timestamp,
    /// Event data supplied by the publisher.
    pub data: serde_json::Value,
    /// Endpoint the envelope is addressed to.
    pub webhook: WebhookRef,
}

/// Endpoint metadata embedded in an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRef {
    /// Endpoint identifier.
    pub id: Uuid,
    /// Endpoint name.
    pub name: String,
}

impl Envelope {
    /// Builds a fresh envelope with a newly generated event id.
    pub fn build(endpoint: &Endpoint, event: EventType, data: serde_json::Value) -> Self {
        let now = Timestamp::now();
        Self {
            id: EventId::generate(),
            event,
            timestamp: now.round(Unit::Millisecond).unwrap_or(now),
            data,
            webhook: WebhookRef {
                id: endpoint.id,
                name: endpoint.name.clone(),
            },
        }
    }

    /// Builds the envelope of a test delivery.
    pub fn test(endpoint: &Endpoint) -> Self {
        let data = serde_json::json!({
            "test": true,
            "message": "This is a test webhook delivery",
        });
        Self::build(endpoint, EventType::test(), data)
    }

    /// Serializes the envelope into the exact bytes that are signed and sent.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
