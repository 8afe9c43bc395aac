//! Endpoint management and delivery log queries.

use uuid::Uuid;

use super::{TRACING_TARGET, WebhookEngine};
use crate::types::{DeliveryFilter, DeliveryRecord, Endpoint, NewEndpoint, UpdateEndpoint};
use crate::{Error, Result, signer};

impl WebhookEngine {
    /// Validates and stores a new endpoint.
    pub async fn register_endpoint(&self, new: NewEndpoint) -> Result<Endpoint> {
        let endpoint = new.into_endpoint()?;
        self.inner.store.insert_endpoint(endpoint.clone()).await?;

        tracing::info!(
            target: TRACING_TARGET,
            endpoint_id = %endpoint.id,
            url = %endpoint.url,
            events = endpoint.events.len(),
            signed = endpoint.secret.is_some(),
            "Endpoint registered"
        );

        Ok(endpoint)
    }

    /// Loads an endpoint.
    pub async fn endpoint(&self, endpoint_id: Uuid) -> Result<Endpoint> {
        self.inner
            .store
            .find_endpoint(endpoint_id)
            .await?
            .ok_or_else(|| {
                Error::not_found().with_message(format!("endpoint {endpoint_id} not found"))
            })
    }

    /// Lists the endpoints of a tenant, or every endpoint when `tenant_id` is `None`.
    pub async fn list_endpoints(&self, tenant_id: Option<&str>) -> Result<Vec<Endpoint>> {
        self.inner.store.list_endpoints(tenant_id).await
    }

    /// Applies changes to an endpoint.
    ///
    /// Setting the status back to active clears the failure streak.
    pub async fn update_endpoint(
        &self,
        endpoint_id: Uuid,
        changes: UpdateEndpoint,
    ) -> Result<Endpoint> {
        let status = changes.status;
        let endpoint = self
            .inner
            .store
            .update_endpoint(endpoint_id, changes)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            endpoint_id = %endpoint.id,
            status = ?status,
            "Endpoint updated"
        );

        Ok(endpoint)
    }

    /// Deletes an endpoint and its delivery records.
    ///
    /// Attempt sequences already running for the endpoint are not
    /// interrupted; they end at their next attempt when the record is gone.
    pub async fn delete_endpoint(&self, endpoint_id: Uuid) -> Result<()> {
        if !self.inner.store.delete_endpoint(endpoint_id).await? {
            return Err(Error::not_found().with_message(format!("endpoint {endpoint_id} not found")));
        }

        tracing::info!(
            target: TRACING_TARGET,
            endpoint_id = %endpoint_id,
            "Endpoint deleted"
        );

        Ok(())
    }

    /// Replaces the signing secret of an endpoint with a freshly generated one.
    pub async fn rotate_secret(&self, endpoint_id: Uuid) -> Result<Endpoint> {
        let endpoint = self
            .inner
            .store
            .replace_secret(endpoint_id, Some(signer::generate_secret()))
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            endpoint_id = %endpoint.id,
            "Endpoint secret rotated"
        );

        Ok(endpoint)
    }

    /// Loads a delivery record.
    pub async fn delivery(&self, delivery_id: Uuid) -> Result<DeliveryRecord> {
        self.inner
            .store
            .find_delivery(delivery_id)
            .await?
            .ok_or_else(|| {
                Error::not_found().with_message(format!("delivery {delivery_id} not found"))
            })
    }

    /// Lists delivery records, newest first.
    pub async fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryRecord>> {
        self.inner.store.list_deliveries(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::engine::testing::{Harness, new_endpoint};
    use crate::mock::MockProvider;
    use crate::types::EndpointStatus;

    #[tokio::test]
    async fn register_and_read_back() {
        let harness = Harness::new(MockProvider::new());
        let endpoint = harness
            .engine
            .register_endpoint(new_endpoint("order.created").with_tenant("acme"))
            .await
            .unwrap();

        assert_eq!(harness.engine.endpoint(endpoint.id).await.unwrap(), endpoint);
        assert_eq!(harness.engine.list_endpoints(Some("acme")).await.unwrap().len(), 1);
        assert!(harness.engine.list_endpoints(Some("globex")).await.unwrap().is_empty());
        assert_eq!(harness.engine.list_endpoints(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_is_not_stored() {
        let harness = Harness::new(MockProvider::new());
        let error = harness
            .engine
            .register_endpoint(NewEndpoint::new("Bad", "ftp://example.com").with_event("a.b"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(harness.engine.list_endpoints(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_validates_and_applies() {
        let harness = Harness::new(MockProvider::new());
        let endpoint = harness.endpoint(new_endpoint("order.created")).await;

        let updated = harness
            .engine
            .update_endpoint(
                endpoint.id,
                UpdateEndpoint {
                    url: Some("https://hooks.example.org/v2".into()),
                    events: Some(vec!["order.paid".into()]),
                    status: Some(EndpointStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.url.as_str(), "https://hooks.example.org/v2");
        assert!(updated.subscribes_to("order.paid"));
        assert!(!updated.subscribes_to("order.created"));
        assert_eq!(updated.status, EndpointStatus::Inactive);

        let error = harness
            .engine
            .update_endpoint(
                endpoint.id,
                UpdateEndpoint {
                    url: Some("not a url".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn rotate_secret_changes_secret() {
        let harness = Harness::new(MockProvider::new());
        let endpoint = harness.endpoint(new_endpoint("order.created")).await;

        let rotated = harness.engine.rotate_secret(endpoint.id).await.unwrap();
        assert_ne!(rotated.secret, endpoint.secret);
        assert!(rotated.secret.unwrap().starts_with(signer::SECRET_PREFIX));
    }

    #[tokio::test]
    async fn delete_unknown_endpoint_is_not_found() {
        let harness = Harness::new(MockProvider::new());
        let error = harness
            .engine
            .delete_endpoint(Uuid::now_v7())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        let error = harness.engine.delivery(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
