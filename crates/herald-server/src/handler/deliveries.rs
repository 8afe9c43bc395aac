//! Delivery log handlers.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use herald_webhook::WebhookEngine;
use validator::Validate;

use crate::extract::{Json, Path, Query};
use crate::handler::Result;
use crate::handler::request::{DeliveryPathParams, ListDeliveriesQuery};
use crate::handler::response::{Deliveries, Delivery};
use crate::service::ServiceState;

/// Tracing target for delivery log operations.
const TRACING_TARGET: &str = "herald_server::handler::deliveries";

/// Lists delivery records, newest first.
#[tracing::instrument(skip_all)]
async fn list_deliveries(
    State(engine): State<WebhookEngine>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Result<(StatusCode, Json<Deliveries>)> {
    query.validate()?;

    let records = engine.list_deliveries(&query.into_filter()).await?;
    let deliveries: Deliveries = records.into_iter().map(Into::into).collect();

    tracing::debug!(
        target: TRACING_TARGET,
        delivery_count = deliveries.len(),
        "Deliveries listed",
    );

    Ok((StatusCode::OK, Json(deliveries)))
}

/// Reads one delivery record.
#[tracing::instrument(skip_all, fields(delivery_id = %path_params.delivery_id))]
async fn read_delivery(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<DeliveryPathParams>,
) -> Result<(StatusCode, Json<Delivery>)> {
    let record = engine.delivery(path_params.delivery_id).await?;
    Ok((StatusCode::OK, Json(record.into())))
}

/// Starts a fresh attempt sequence for a delivery that did not succeed.
///
/// Rejected with `409 Conflict` for deliveries that already succeeded or
/// have an attempt in flight.
#[tracing::instrument(skip_all, fields(delivery_id = %path_params.delivery_id))]
async fn retry_delivery(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<DeliveryPathParams>,
) -> Result<(StatusCode, Json<Delivery>)> {
    let record = engine.retry_delivery(path_params.delivery_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        sequence = record.sequence,
        "Manual retry accepted",
    );

    Ok((StatusCode::ACCEPTED, Json(record.into())))
}

/// Returns routes for the delivery log.
pub fn routes() -> Router<ServiceState> {
    use axum::routing::{get, post};

    Router::new()
        .route("/deliveries", get(list_deliveries))
        .route("/deliveries/{deliveryId}", get(read_delivery))
        .route("/deliveries/{deliveryId}/retry", post(retry_delivery))
}

#[cfg(test)]
mod tests {
    use herald_webhook::TriggerEvent;
    use herald_webhook::mock::{MockProvider, MockReply};
    use herald_webhook::types::{DeliveryStatus, NewEndpoint};
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::*;
    use crate::handler::test::create_test_server_with_mock;
    use crate::service::ServiceState;

    async fn deliver_once(state: &ServiceState, max_retries: u32) -> anyhow::Result<Uuid> {
        let engine = &state.engine;
        engine
            .register_endpoint(
                NewEndpoint::new("Receiver", "https://receiver.example.com/hooks")
                    .with_event("order.created")
                    .with_max_retries(max_retries),
            )
            .await?;

        let summary = engine
            .trigger(TriggerEvent::new("order.created", json!({})))
            .await?;
        engine.wait_idle().await;
        Ok(summary.deliveries[0])
    }

    #[tokio::test]
    async fn failed_delivery_can_be_retried() -> anyhow::Result<()> {
        let mock = MockProvider::always(MockReply::status(200))
            .then(MockReply::status(500).with_body("down"));
        let (server, state) = create_test_server_with_mock(&mock)?;
        let delivery_id = deliver_once(&state, 1).await?;

        let path = format!("/deliveries/{delivery_id}");
        let failed = server.get(&path).await.json::<Delivery>();
        assert_eq!(failed.status, DeliveryStatus::Failed);
        assert_eq!(failed.response.unwrap().status_code, 500);

        let response = server.post(&format!("{path}/retry")).await;
        response.assert_status(StatusCode::ACCEPTED);
        assert_eq!(response.json::<Delivery>().sequence, 1);

        state.engine.wait_idle().await;
        let retried = server.get(&path).await.json::<Delivery>();
        assert_eq!(retried.status, DeliveryStatus::Success);
        assert_eq!(retried.event_id, failed.event_id);
        assert_eq!(mock.request_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn successful_delivery_cannot_be_retried() -> anyhow::Result<()> {
        let (server, state) = create_test_server_with_mock(&MockProvider::new())?;
        let delivery_id = deliver_once(&state, 3).await?;

        let response = server
            .post(&format!("/deliveries/{delivery_id}/retry"))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["name"], "conflict");
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_status() -> anyhow::Result<()> {
        let mock = MockProvider::always(MockReply::status(410));
        let (server, state) = create_test_server_with_mock(&mock)?;
        deliver_once(&state, 1).await?;

        let failed = server
            .get("/deliveries")
            .add_query_param("status", "FAILED")
            .await
            .json::<Vec<Value>>();
        assert_eq!(failed.len(), 1);

        let succeeded = server
            .get("/deliveries")
            .add_query_param("status", "SUCCESS")
            .await
            .json::<Vec<Value>>();
        assert!(succeeded.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn limit_is_bounded() -> anyhow::Result<()> {
        let (server, _) = create_test_server_with_mock(&MockProvider::new())?;

        server
            .get("/deliveries")
            .add_query_param("limit", 0)
            .await
            .assert_status_bad_request();
        server
            .get("/deliveries")
            .add_query_param("limit", 10)
            .await
            .assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn unknown_delivery_is_not_found() -> anyhow::Result<()> {
        let (server, _) = create_test_server_with_mock(&MockProvider::new())?;

        server
            .get(&format!("/deliveries/{}", Uuid::new_v4()))
            .await
            .assert_status_not_found();
        Ok(())
    }
}
