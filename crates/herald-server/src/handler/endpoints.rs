//! Endpoint management handlers.
//!
//! Endpoints are registered, read, updated and deleted here. The signing
//! secret is returned only when an endpoint is created or its secret rotated.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use herald_webhook::WebhookEngine;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{
    CreateEndpoint, EndpointPathParams, ListEndpointsQuery, UpdateEndpoint,
};
use crate::handler::response::{Delivery, Endpoint, EndpointWithSecret, Endpoints};
use crate::service::ServiceState;

/// Tracing target for endpoint operations.
const TRACING_TARGET: &str = "herald_server::handler::endpoints";

/// Registers a new endpoint.
///
/// Returns the endpoint with its secret. The secret is only shown here and
/// after a rotation.
#[tracing::instrument(skip_all)]
async fn create_endpoint(
    State(engine): State<WebhookEngine>,
    ValidateJson(request): ValidateJson<CreateEndpoint>,
) -> Result<(StatusCode, Json<EndpointWithSecret>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating endpoint");

    let endpoint = engine.register_endpoint(request.into_model()).await?;

    tracing::info!(
        target: TRACING_TARGET,
        endpoint_id = %endpoint.id,
        "Endpoint created",
    );

    Ok((StatusCode::CREATED, Json(endpoint.into())))
}

/// Lists endpoints, optionally restricted to one tenant.
#[tracing::instrument(skip_all, fields(tenant_id = ?query.tenant_id))]
async fn list_endpoints(
    State(engine): State<WebhookEngine>,
    Query(query): Query<ListEndpointsQuery>,
) -> Result<(StatusCode, Json<Endpoints>)> {
    let endpoints = engine.list_endpoints(query.tenant_id.as_deref()).await?;
    let endpoints: Endpoints = endpoints.into_iter().map(Into::into).collect();

    tracing::debug!(
        target: TRACING_TARGET,
        endpoint_count = endpoints.len(),
        "Endpoints listed",
    );

    Ok((StatusCode::OK, Json(endpoints)))
}

/// Reads one endpoint without its secret.
#[tracing::instrument(skip_all, fields(endpoint_id = %path_params.endpoint_id))]
async fn read_endpoint(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<EndpointPathParams>,
) -> Result<(StatusCode, Json<Endpoint>)> {
    let endpoint = engine.endpoint(path_params.endpoint_id).await?;
    Ok((StatusCode::OK, Json(endpoint.into())))
}

/// Updates an endpoint. Omitted fields stay unchanged.
#[tracing::instrument(skip_all, fields(endpoint_id = %path_params.endpoint_id))]
async fn update_endpoint(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<EndpointPathParams>,
    ValidateJson(request): ValidateJson<UpdateEndpoint>,
) -> Result<(StatusCode, Json<Endpoint>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating endpoint");

    let endpoint = engine
        .update_endpoint(path_params.endpoint_id, request.into_model())
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        status = %endpoint.status,
        "Endpoint updated",
    );

    Ok((StatusCode::OK, Json(endpoint.into())))
}

/// Deletes an endpoint together with its delivery records.
#[tracing::instrument(skip_all, fields(endpoint_id = %path_params.endpoint_id))]
async fn delete_endpoint(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<EndpointPathParams>,
) -> Result<StatusCode> {
    engine.delete_endpoint(path_params.endpoint_id).await?;

    tracing::info!(target: TRACING_TARGET, "Endpoint deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the signing secret with a freshly generated one.
#[tracing::instrument(skip_all, fields(endpoint_id = %path_params.endpoint_id))]
async fn rotate_secret(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<EndpointPathParams>,
) -> Result<(StatusCode, Json<EndpointWithSecret>)> {
    let endpoint = engine.rotate_secret(path_params.endpoint_id).await?;

    tracing::info!(target: TRACING_TARGET, "Endpoint secret rotated");

    Ok((StatusCode::OK, Json(endpoint.into())))
}

/// Sends a `webhook.test` event to the endpoint.
///
/// Answers as soon as the delivery is recorded; the attempt runs in the
/// background.
#[tracing::instrument(skip_all, fields(endpoint_id = %path_params.endpoint_id))]
async fn test_endpoint(
    State(engine): State<WebhookEngine>,
    Path(path_params): Path<EndpointPathParams>,
) -> Result<(StatusCode, Json<Delivery>)> {
    let record = engine.send_test_event(path_params.endpoint_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        delivery_id = %record.id,
        "Test delivery scheduled",
    );

    Ok((StatusCode::ACCEPTED, Json(record.into())))
}

/// Returns routes for endpoint management.
pub fn routes() -> Router<ServiceState> {
    use axum::routing::{get, post};

    Router::new()
        .route("/endpoints", post(create_endpoint).get(list_endpoints))
        .route(
            "/endpoints/{endpointId}",
            get(read_endpoint)
                .patch(update_endpoint)
                .delete(delete_endpoint),
        )
        .route("/endpoints/{endpointId}/rotate-secret", post(rotate_secret))
        .route("/endpoints/{endpointId}/test", post(test_endpoint))
}
