//! Subscription registry and delivery log.
//!
//! The engine talks to storage only through [`EndpointRepository`] and
//! [`DeliveryRepository`]. Implementations must apply every method
//! atomically: in particular [`EndpointRepository::record_endpoint_attempt`]
//! updates all counters of one attempt in a single step so concurrent
//! deliveries to the same endpoint never lose updates.

mod memory;

use jiff::Timestamp;
use uuid::Uuid;

pub use self::memory::MemoryStore;
use crate::Result;
use crate::engine::{AttemptOutcome, HealthTransition};
use crate::types::{DeliveryFilter, DeliveryRecord, Endpoint, UpdateEndpoint};

/// Tracing target for registry operations.
pub const TRACING_TARGET: &str = "herald_webhook::store";

/// Storage of webhook endpoints.
#[async_trait::async_trait]
pub trait EndpointRepository: Send + Sync {
    /// Stores a newly registered endpoint.
    async fn insert_endpoint(&self, endpoint: Endpoint) -> Result<()>;

    /// Loads an endpoint by id.
    async fn find_endpoint(&self, endpoint_id: Uuid) -> Result<Option<Endpoint>>;

    /// Lists endpoints of a tenant, or all endpoints when `tenant_id` is `None`.
    async fn list_endpoints(&self, tenant_id: Option<&str>) -> Result<Vec<Endpoint>>;

    /// Returns active endpoints of exactly `tenant_id` subscribed to `event`.
    async fn subscribed_endpoints(
        &self,
        event: &str,
        tenant_id: Option<&str>,
    ) -> Result<Vec<Endpoint>>;

    /// Applies validated changes and returns the updated endpoint.
    async fn update_endpoint(&self, endpoint_id: Uuid, changes: UpdateEndpoint)
    -> Result<Endpoint>;

    /// Replaces the signing secret and returns the updated endpoint.
    async fn replace_secret(&self, endpoint_id: Uuid, secret: Option<String>) -> Result<Endpoint>;

    /// Stamps `last_triggered_at`.
    async fn mark_triggered(&self, endpoint_id: Uuid, at: Timestamp) -> Result<()>;

    /// Folds one attempt outcome into the endpoint's counters and status.
    ///
    /// Returns `None` if the endpoint no longer exists.
    async fn record_endpoint_attempt(
        &self,
        endpoint_id: Uuid,
        outcome: &AttemptOutcome,
    ) -> Result<Option<HealthTransition>>;

    /// Deletes an endpoint together with its delivery records.
    ///
    /// Returns whether the endpoint existed.
    async fn delete_endpoint(&self, endpoint_id: Uuid) -> Result<bool>;

    /// Returns the number of registered endpoints.
    async fn count_endpoints(&self) -> Result<usize>;
}

/// Storage of delivery records.
#[async_trait::async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Stores a newly created delivery record.
    async fn insert_delivery(&self, record: DeliveryRecord) -> Result<()>;

    /// Loads a delivery record by id.
    async fn find_delivery(&self, delivery_id: Uuid) -> Result<Option<DeliveryRecord>>;

    /// Marks a record as `SENDING` if it belongs to attempt sequence `sequence`
    /// and is waiting for an attempt.
    ///
    /// Returns the claimed record, or `None` when the record is gone or owned
    /// by another attempt sequence.
    async fn claim_delivery(&self, delivery_id: Uuid, sequence: u32)
    -> Result<Option<DeliveryRecord>>;

    /// Replaces a stored record. Returns whether it still existed.
    async fn update_delivery(&self, record: DeliveryRecord) -> Result<bool>;

    /// Starts a fresh attempt sequence on a record.
    ///
    /// Fails with `NotFound` for unknown records and `Conflict` for records
    /// that succeeded or have an attempt in flight.
    async fn reset_delivery(&self, delivery_id: Uuid) -> Result<DeliveryRecord>;

    /// Lists records matching `filter`, newest first.
    async fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryRecord>>;

    /// Deletes records created before `cutoff` and returns how many were removed.
    async fn purge_deliveries(&self, cutoff: Timestamp) -> Result<u64>;
}

/// A complete registry: endpoints plus their delivery log.
pub trait WebhookStore: EndpointRepository + DeliveryRepository {}

impl<T> WebhookStore for T where T: EndpointRepository + DeliveryRepository {}
