//! Endpoint response types.

use std::collections::{BTreeSet, HashMap};

use herald_webhook::types::{self as model, DeliveryStats, EndpointStatus, EventType};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Endpoint response. Never includes the signing secret.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Unique endpoint identifier.
    pub endpoint_id: Uuid,
    /// Tenant the endpoint belongs to.
    pub tenant_id: Option<String>,
    /// Human-readable name.
    pub name: String,
    /// Delivery target.
    pub url: String,
    /// Whether deliveries are signed.
    pub signed: bool,
    /// Subscribed event types.
    pub events: BTreeSet<EventType>,
    /// Current status.
    pub status: EndpointStatus,
    /// Custom headers sent with every delivery.
    pub headers: HashMap<String, String>,
    /// Maximum number of HTTP attempts per delivery.
    pub max_retries: u32,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
    /// Delivery counters.
    pub stats: DeliveryStats,
    /// Last time an event was dispatched to this endpoint.
    pub last_triggered_at: Option<Timestamp>,
    /// Last successful attempt.
    pub last_success_at: Option<Timestamp>,
    /// Last failed attempt.
    pub last_failure_at: Option<Timestamp>,
    /// Error message of the last failed attempt.
    pub last_error_message: Option<String>,
    /// Timestamp when this endpoint was registered.
    pub created_at: Timestamp,
    /// Timestamp when this endpoint was last modified.
    pub updated_at: Timestamp,
}

impl From<model::Endpoint> for Endpoint {
    fn from(endpoint: model::Endpoint) -> Self {
        Self {
            endpoint_id: endpoint.id,
            tenant_id: endpoint.tenant_id,
            name: endpoint.name,
            url: endpoint.url.into(),
            signed: endpoint.secret.is_some(),
            events: endpoint.events,
            status: endpoint.status,
            headers: endpoint.headers,
            max_retries: endpoint.max_retries,
            timeout_secs: endpoint.timeout_secs,
            verify_tls: endpoint.verify_tls,
            stats: endpoint.stats,
            last_triggered_at: endpoint.last_triggered_at,
            last_success_at: endpoint.last_success_at,
            last_failure_at: endpoint.last_failure_at,
            last_error_message: endpoint.last_error_message,
            created_at: endpoint.created_at,
            updated_at: endpoint.updated_at,
        }
    }
}

/// Response for listing endpoints.
pub type Endpoints = Vec<Endpoint>;

/// Endpoint response including its signing secret.
///
/// Only returned on registration and secret rotation.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointWithSecret {
    /// The endpoint.
    #[serde(flatten)]
    pub endpoint: Endpoint,
    /// The signing secret, absent for unsigned endpoints.
    pub secret: Option<String>,
}

impl From<model::Endpoint> for EndpointWithSecret {
    fn from(mut endpoint: model::Endpoint) -> Self {
        let secret = endpoint.secret.take();
        let mut endpoint = Endpoint::from(endpoint);
        endpoint.signed = secret.is_some();
        Self { endpoint, secret }
    }
}
