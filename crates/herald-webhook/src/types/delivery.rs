//! Delivery log records.

use std::collections::HashMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeliveryStatus, Endpoint, EventId, EventType};
use crate::payload::Envelope;

/// Default page size for delivery listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest page size accepted for delivery listings.
pub const MAX_LIST_LIMIT: usize = 500;

/// Metadata of the last HTTP response received for a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body, truncated before storage.
    pub body: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Round-trip time of the attempt in milliseconds.
    pub elapsed_ms: u64,
}

/// One envelope delivered to one endpoint, mutated across its attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Endpoint the envelope is delivered to.
    pub endpoint_id: Uuid,
    /// Tenant of the owning endpoint.
    pub tenant_id: Option<String>,
    /// Event type of the envelope.
    pub event: EventType,
    /// Correlation identifier, identical to `payload.id`.
    pub event_id: EventId,
    /// Domain entity the event refers to, if any.
    pub entity_id: Option<String>,
    /// Envelope sent on every attempt.
    pub payload: Envelope,
    /// Current delivery state.
    pub status: DeliveryStatus,
    /// Number of HTTP attempts made in the current attempt sequence.
    pub attempt_count: u32,
    /// Attempt sequence number, incremented by every manual retry.
    pub sequence: u32,
    /// Last HTTP response, if the endpoint answered at all.
    pub response: Option<ResponseInfo>,
    /// Failure description of the last attempt.
    pub error_message: Option<String>,
    /// Time of the last attempt.
    pub sent_at: Option<Timestamp>,
    /// Time of the next scheduled attempt, set only while retrying.
    pub next_retry_at: Option<Timestamp>,
    /// Timestamp when the record was created.
    pub created_at: Timestamp,
    /// Timestamp when the record was last modified.
    pub updated_at: Timestamp,
}

impl DeliveryRecord {
    /// Creates a pending record for delivering `payload` to `endpoint`.
    pub fn new(endpoint: &Endpoint, payload: Envelope, entity_id: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: Uuid::now_v7(),
            endpoint_id: endpoint.id,
            tenant_id: endpoint.tenant_id.clone(),
            event: payload.event.clone(),
            event_id: payload.id.clone(),
            entity_id,
            payload,
            status: DeliveryStatus::Pending,
            attempt_count: 0,
            sequence: 0,
            response: None,
            error_message: None,
            sent_at: None,
            next_retry_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns whether the record can be claimed for a new attempt.
    #[inline]
    pub fn is_claimable(&self) -> bool {
        matches!(
            self.status,
            DeliveryStatus::Pending | DeliveryStatus::Retrying
        )
    }
}

/// Criteria for listing delivery records.
#[derive(Debug, Default, Clone)]
pub struct DeliveryFilter {
    /// Only records of this endpoint.
    pub endpoint_id: Option<Uuid>,
    /// Only records in this state.
    pub status: Option<DeliveryStatus>,
    /// Only records of this tenant.
    pub tenant_id: Option<String>,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
}

impl DeliveryFilter {
    /// Returns the effective page size.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    /// Returns whether `record` satisfies the filter.
    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        self.endpoint_id.is_none_or(|id| record.endpoint_id == id)
            && self.status.is_none_or(|status| record.status == status)
            && self
                .tenant_id
                .as_deref()
                .is_none_or(|tenant| record.tenant_id.as_deref() == Some(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewEndpoint;

    fn record() -> DeliveryRecord {
        let endpoint = NewEndpoint::new("Stock", "https://example.com/hooks")
            .with_tenant("acme")
            .with_event("stock.low")
            .into_endpoint()
            .unwrap();
        let event = EventType::new("stock.low").unwrap();
        let payload = Envelope::build(&endpoint, event, serde_json::json!({"sku": "A-1"}));
        DeliveryRecord::new(&endpoint, payload, Some("A-1".into()))
    }

    #[test]
    fn new_record_is_pending() {
        let record = record();

        assert_eq!(record.status, DeliveryStatus::Pending);
        assert_eq!(record.attempt_count, 0);
        assert_eq!(record.event_id, record.payload.id);
        assert_eq!(record.tenant_id.as_deref(), Some("acme"));
        assert!(record.is_claimable());
    }

    #[test]
    fn filter_matching() {
        let record = record();

        assert!(DeliveryFilter::default().matches(&record));
        assert!(
            DeliveryFilter {
                endpoint_id: Some(record.endpoint_id),
                status: Some(DeliveryStatus::Pending),
                tenant_id: Some("acme".into()),
                limit: None,
            }
            .matches(&record)
        );
        assert!(
            !DeliveryFilter {
                status: Some(DeliveryStatus::Failed),
                ..Default::default()
            }
            .matches(&record)
        );
        assert!(
            !DeliveryFilter {
                tenant_id: Some("globex".into()),
                ..Default::default()
            }
            .matches(&record)
        );
    }

    #[test]
    fn filter_limit_is_clamped() {
        assert_eq!(DeliveryFilter::default().effective_limit(), DEFAULT_LIST_LIMIT);

        let filter = DeliveryFilter {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), MAX_LIST_LIMIT);
    }
}
