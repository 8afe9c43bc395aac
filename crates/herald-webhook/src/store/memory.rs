//! In-memory registry.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DeliveryRepository, EndpointRepository, TRACING_TARGET};
use crate::engine::{self, AttemptOutcome, HealthTransition};
use crate::types::{DeliveryFilter, DeliveryRecord, DeliveryStatus, Endpoint, UpdateEndpoint};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Tables {
    endpoints: HashMap<Uuid, Endpoint>,
    deliveries: HashMap<Uuid, DeliveryRecord>,
}

/// Registry keeping endpoints and delivery records in process memory.
///
/// Clones share the same tables. Nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn endpoint_not_found(endpoint_id: Uuid) -> Error {
    Error::not_found().with_message(format!("endpoint {endpoint_id} not found"))
}

#[async_trait::async_trait]
impl EndpointRepository for MemoryStore {
    async fn insert_endpoint(&self, endpoint: Endpoint) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.endpoints.contains_key(&endpoint.id) {
            return Err(Error::conflict()
                .with_message(format!("endpoint {} already exists", endpoint.id)));
        }
        tables.endpoints.insert(endpoint.id, endpoint);
        Ok(())
    }

    async fn find_endpoint(&self, endpoint_id: Uuid) -> Result<Option<Endpoint>> {
        Ok(self.tables.read().await.endpoints.get(&endpoint_id).cloned())
    }

    async fn list_endpoints(&self, tenant_id: Option<&str>) -> Result<Vec<Endpoint>> {
        let tables = self.tables.read().await;
        let mut endpoints: Vec<_> = tables
            .endpoints
            .values()
            .filter(|e| tenant_id.is_none() || e.matches_tenant(tenant_id))
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(endpoints)
    }

    async fn subscribed_endpoints(
        &self,
        event: &str,
        tenant_id: Option<&str>,
    ) -> Result<Vec<Endpoint>> {
        let tables = self.tables.read().await;
        Ok(tables
            .endpoints
            .values()
            .filter(|e| e.is_active() && e.matches_tenant(tenant_id) && e.subscribes_to(event))
            .cloned()
            .collect())
    }

    async fn update_endpoint(
        &self,
        endpoint_id: Uuid,
        changes: UpdateEndpoint,
    ) -> Result<Endpoint> {
        let mut tables = self.tables.write().await;
        let endpoint = tables
            .endpoints
            .get_mut(&endpoint_id)
            .ok_or_else(|| endpoint_not_found(endpoint_id))?;
        changes.apply(endpoint)?;
        Ok(endpoint.clone())
    }

    async fn replace_secret(&self, endpoint_id: Uuid, secret: Option<String>) -> Result<Endpoint> {
        let mut tables = self.tables.write().await;
        let endpoint = tables
            .endpoints
            .get_mut(&endpoint_id)
            .ok_or_else(|| endpoint_not_found(endpoint_id))?;
        endpoint.secret = secret;
        endpoint.updated_at = Timestamp::now();
        Ok(endpoint.clone())
    }

    async fn mark_triggered(&self, endpoint_id: Uuid, at: Timestamp) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(endpoint) = tables.endpoints.get_mut(&endpoint_id) {
            endpoint.last_triggered_at = Some(at);
        }
        Ok(())
    }

    async fn record_endpoint_attempt(
        &self,
        endpoint_id: Uuid,
        outcome: &AttemptOutcome,
    ) -> Result<Option<HealthTransition>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .endpoints
            .get_mut(&endpoint_id)
            .map(|endpoint| engine::health::apply(endpoint, outcome)))
    }

    async fn delete_endpoint(&self, endpoint_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.endpoints.remove(&endpoint_id).is_none() {
            return Ok(false);
        }

        let before = tables.deliveries.len();
        tables.deliveries.retain(|_, r| r.endpoint_id != endpoint_id);

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint_id = %endpoint_id,
            deliveries_removed = before - tables.deliveries.len(),
            "Endpoint deleted"
        );

        Ok(true)
    }

    async fn count_endpoints(&self) -> Result<usize> {
        Ok(self.tables.read().await.endpoints.len())
    }
}

#[async_trait::async_trait]
impl DeliveryRepository for MemoryStore {
    async fn insert_delivery(&self, record: DeliveryRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.endpoints.contains_key(&record.endpoint_id) {
            return Err(endpoint_not_found(record.endpoint_id));
        }
        tables.deliveries.insert(record.id, record);
        Ok(())
    }

    async fn find_delivery(&self, delivery_id: Uuid) -> Result<Option<DeliveryRecord>> {
        Ok(self.tables.read().await.deliveries.get(&delivery_id).cloned())
    }

    async fn claim_delivery(
        &self,
        delivery_id: Uuid,
        sequence: u32,
    ) -> Result<Option<DeliveryRecord>> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.deliveries.get_mut(&delivery_id) else {
            return Ok(None);
        };
        if record.sequence != sequence || !record.is_claimable() {
            return Ok(None);
        }

        record.status = DeliveryStatus::Sending;
        record.next_retry_at = None;
        record.updated_at = Timestamp::now();
        Ok(Some(record.clone()))
    }

    async fn update_delivery(&self, record: DeliveryRecord) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.deliveries.get_mut(&record.id) {
            Some(stored) => {
                *stored = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reset_delivery(&self, delivery_id: Uuid) -> Result<DeliveryRecord> {
        let mut tables = self.tables.write().await;
        let record = tables.deliveries.get_mut(&delivery_id).ok_or_else(|| {
            Error::not_found().with_message(format!("delivery {delivery_id} not found"))
        })?;

        match record.status {
            DeliveryStatus::Success => {
                return Err(Error::conflict().with_message("delivery already succeeded"));
            }
            DeliveryStatus::Sending => {
                return Err(Error::conflict().with_message("delivery attempt is in progress"));
            }
            DeliveryStatus::Pending | DeliveryStatus::Failed | DeliveryStatus::Retrying => {}
        }

        record.status = DeliveryStatus::Pending;
        record.attempt_count = 0;
        record.sequence = record.sequence.wrapping_add(1);
        record.error_message = None;
        record.next_retry_at = None;
        record.updated_at = Timestamp::now();
        Ok(record.clone())
    }

    async fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<_> = tables
            .deliveries
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(filter.effective_limit());
        Ok(records)
    }

    async fn purge_deliveries(&self, cutoff: Timestamp) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.deliveries.len();
        tables.deliveries.retain(|_, r| r.created_at >= cutoff);
        Ok((before - tables.deliveries.len()) as u64)
    }
}
