//! Event publishing handler.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use herald_webhook::WebhookEngine;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::TriggerEventRequest;
use crate::handler::response::Dispatched;
use crate::service::ServiceState;

/// Tracing target for event publishing.
const TRACING_TARGET: &str = "herald_server::handler::events";

/// Publishes an event to every active subscribed endpoint.
///
/// Answers once the delivery records exist; no HTTP attempt is awaited.
#[tracing::instrument(skip_all, fields(event = %request.event))]
async fn trigger_event(
    State(engine): State<WebhookEngine>,
    ValidateJson(request): ValidateJson<TriggerEventRequest>,
) -> Result<(StatusCode, Json<Dispatched>)> {
    let summary = engine.trigger(request.into_trigger()).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        dispatched = summary.dispatched,
        "Event accepted",
    );

    Ok((StatusCode::ACCEPTED, Json(summary.into())))
}

/// Returns routes for event publishing.
pub fn routes() -> Router<ServiceState> {
    use axum::routing::post;

    Router::new().route("/events", post(trigger_event))
}
