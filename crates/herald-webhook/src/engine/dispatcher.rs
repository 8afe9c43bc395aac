//! Event fan-out to subscribed endpoints.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TRACING_TARGET, WebhookEngine};
use crate::payload::Envelope;
use crate::types::{DeliveryRecord, EventType};
use crate::{ErrorKind, Result};

/// A domain event to deliver.
#[must_use]
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    /// Event type name.
    pub event: String,
    /// Event data placed in the envelope.
    pub data: serde_json::Value,
    /// Tenant whose endpoints receive the event; `None` targets unscoped endpoints.
    pub tenant_id: Option<String>,
    /// Domain entity the event refers to.
    pub entity_id: Option<String>,
}

impl TriggerEvent {
    /// Creates an unscoped trigger.
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
            tenant_id: None,
            entity_id: None,
        }
    }

    /// Scopes the trigger to a tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Attaches the id of the entity the event refers to.
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }
}

/// What a trigger started.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    /// Number of endpoints a delivery was started for.
    pub dispatched: usize,
    /// Ids of the created delivery records.
    pub deliveries: Vec<Uuid>,
}

impl WebhookEngine {
    /// Starts one delivery per active endpoint subscribed to the event.
    ///
    /// Records are persisted before their attempt sequence is spawned, and
    /// this call returns without waiting for any HTTP attempt. It fails only
    /// if the event type is invalid or the registry cannot be queried.
    pub async fn trigger(&self, trigger: TriggerEvent) -> Result<DispatchSummary> {
        self.ensure_running()?;
        let event = EventType::new(trigger.event)?;
        let tenant_id = trigger.tenant_id.as_deref();

        let endpoints = self
            .inner
            .store
            .subscribed_endpoints(event.as_str(), tenant_id)
            .await
            .inspect_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET,
                    event = %event,
                    error = %error,
                    "Failed to resolve subscribed endpoints"
                );
            })?;

        let mut summary = DispatchSummary::default();
        let now = Timestamp::now();

        for endpoint in endpoints {
            let payload = Envelope::build(&endpoint, event.clone(), trigger.data.clone());
            let record = DeliveryRecord::new(&endpoint, payload, trigger.entity_id.clone());
            let delivery_id = record.id;

            match self.inner.store.insert_delivery(record).await {
                Ok(()) => {}
                // The endpoint was deleted after it was resolved.
                Err(error) if error.kind() == ErrorKind::NotFound => continue,
                Err(error) => return Err(error),
            }
            self.inner.store.mark_triggered(endpoint.id, now).await?;
            self.spawn_sequence(delivery_id, 0);

            summary.deliveries.push(delivery_id);
        }
        summary.dispatched = summary.deliveries.len();

        tracing::info!(
            target: TRACING_TARGET,
            event = %event,
            tenant_id = tenant_id.unwrap_or_default(),
            entity_id = trigger.entity_id.as_deref().unwrap_or_default(),
            dispatched = summary.dispatched,
            "Event dispatched"
        );

        Ok(summary)
    }

    /// Sends a `webhook.test` envelope to one endpoint, whatever its
    /// subscriptions and status.
    pub async fn send_test_event(&self, endpoint_id: Uuid) -> Result<DeliveryRecord> {
        self.ensure_running()?;
        let endpoint = self.endpoint(endpoint_id).await?;

        let record = DeliveryRecord::new(&endpoint, Envelope::test(&endpoint), None);
        self.inner.store.insert_delivery(record.clone()).await?;
        self.spawn_sequence(record.id, record.sequence);

        tracing::info!(
            target: TRACING_TARGET,
            endpoint_id = %endpoint.id,
            delivery_id = %record.id,
            event_id = %record.event_id,
            "Test event dispatched"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::engine::testing::{Harness, new_endpoint};
    use crate::headers;
    use crate::mock::MockProvider;
    use crate::types::{DeliveryFilter, DeliveryStatus, EndpointStatus, UpdateEndpoint};

    #[tokio::test(start_paused = true)]
    async fn no_subscribers_creates_nothing() {
        let harness = Harness::new(MockProvider::new());
        harness.endpoint(new_endpoint("order.created")).await;

        let summary = harness.trigger("stock.low").await;
        harness.settle().await;

        assert_eq!(summary.dispatched, 0);
        assert!(summary.deliveries.is_empty());
        let records = harness
            .engine
            .list_deliveries(&DeliveryFilter::default())
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(harness.mock.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fans_out_to_every_subscriber() {
        let harness = Harness::new(MockProvider::new());
        harness.endpoint(new_endpoint("order.created")).await;
        harness
            .endpoint(new_endpoint("order.created").with_event("order.paid"))
            .await;
        harness.endpoint(new_endpoint("order.paid")).await;

        let summary = harness.trigger("order.created").await;
        assert_eq!(summary.dispatched, 2);

        // Records exist as soon as the trigger returns.
        for id in &summary.deliveries {
            assert!(harness.engine.delivery(*id).await.is_ok());
        }

        harness.settle().await;
        assert_eq!(harness.mock.request_count(), 2);

        let ids: HashSet<_> = harness
            .mock
            .requests()
            .iter()
            .map(|r| r.header(headers::EVENT_ID).unwrap().to_owned())
            .collect();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_inactive_and_suspended_endpoints() {
        let harness = Harness::new(MockProvider::new());
        harness
            .endpoint(new_endpoint("order.created").with_status(EndpointStatus::Inactive))
            .await;
        let suspended = harness.endpoint(new_endpoint("order.created")).await;
        harness
            .engine
            .update_endpoint(
                suspended.id,
                UpdateEndpoint {
                    status: Some(EndpointStatus::Suspended),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let summary = harness.trigger("order.created").await;
        assert_eq!(summary.dispatched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tenant_scoping_is_exact() {
        let harness = Harness::new(MockProvider::new());
        let acme = harness
            .endpoint(new_endpoint("order.created").with_tenant("acme"))
            .await;
        harness
            .endpoint(new_endpoint("order.created").with_tenant("globex"))
            .await;
        let global = harness.endpoint(new_endpoint("order.created")).await;

        let trigger = TriggerEvent::new("order.created", serde_json::json!({"id": 1}))
            .with_tenant("acme")
            .with_entity("order-1");
        let summary = harness.engine.trigger(trigger).await.unwrap();
        assert_eq!(summary.dispatched, 1);

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.endpoint_id, acme.id);
        assert_eq!(record.entity_id.as_deref(), Some("order-1"));
        assert_eq!(record.tenant_id.as_deref(), Some("acme"));

        let summary = harness.trigger("order.created").await;
        assert_eq!(summary.dispatched, 1);
        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.endpoint_id, global.id);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_triggers_get_distinct_event_ids() {
        let harness = Harness::new(MockProvider::new());
        harness.endpoint(new_endpoint("order.created")).await;

        let mut event_ids = HashSet::new();
        for _ in 0..200 {
            let summary = harness.trigger("order.created").await;
            let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
            event_ids.insert(record.event_id);
        }
        harness.settle().await;

        assert_eq!(event_ids.len(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_event_type_is_rejected() {
        let harness = Harness::new(MockProvider::new());
        let error = harness
            .engine
            .trigger(TriggerEvent::new("not valid", serde_json::Value::Null))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_ignores_subscriptions() {
        let harness = Harness::new(MockProvider::new());
        let endpoint = harness.endpoint(new_endpoint("order.created")).await;

        let record = harness.engine.send_test_event(endpoint.id).await.unwrap();
        harness.settle().await;

        assert_eq!(record.event.as_str(), EventType::TEST);
        let record = harness.engine.delivery(record.id).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Success);

        let request = &harness.mock.requests()[0];
        assert_eq!(request.header(headers::EVENT_TYPE), Some(EventType::TEST));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_for_unknown_endpoint() {
        let harness = Harness::new(MockProvider::new());
        let error = harness
            .engine
            .send_test_event(Uuid::now_v7())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
