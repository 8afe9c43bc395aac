//! Delivery record response types.

use herald_webhook::Envelope;
use herald_webhook::types::{self as model, DeliveryStatus, EventId, EventType, ResponseInfo};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery record response.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Unique delivery identifier.
    pub delivery_id: Uuid,
    /// Endpoint the envelope is delivered to.
    pub endpoint_id: Uuid,
    /// Tenant of the owning endpoint.
    pub tenant_id: Option<String>,
    /// Event type of the envelope.
    pub event: EventType,
    /// Correlation identifier of the envelope.
    pub event_id: EventId,
    /// Domain entity the event refers to.
    pub entity_id: Option<String>,
    /// The envelope sent on every attempt.
    pub payload: Envelope,
    /// Current delivery state.
    pub status: DeliveryStatus,
    /// HTTP attempts made in the current attempt sequence.
    pub attempt_count: u32,
    /// Attempt sequence number, incremented by every manual retry.
    pub sequence: u32,
    /// Last response received from the endpoint.
    pub response: Option<ResponseInfo>,
    /// Failure description of the last attempt.
    pub error_message: Option<String>,
    /// Time of the last attempt.
    pub sent_at: Option<Timestamp>,
    /// Time of the next scheduled attempt.
    pub next_retry_at: Option<Timestamp>,
    /// Timestamp when this record was created.
    pub created_at: Timestamp,
    /// Timestamp when this record was last modified.
    pub updated_at: Timestamp,
}

impl From<model::DeliveryRecord> for Delivery {
    fn from(record: model::DeliveryRecord) -> Self {
        Self {
            delivery_id: record.id,
            endpoint_id: record.endpoint_id,
            tenant_id: record.tenant_id,
            event: record.event,
            event_id: record.event_id,
            entity_id: record.entity_id,
            payload: record.payload,
            status: record.status,
            attempt_count: record.attempt_count,
            sequence: record.sequence,
            response: record.response,
            error_message: record.error_message,
            sent_at: record.sent_at,
            next_retry_at: record.next_retry_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for listing delivery records.
pub type Deliveries = Vec<Delivery>;
