//! Engine health handler.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use herald_webhook::WebhookEngine;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::MonitorStatus;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "herald_server::handler::monitors";

/// Reports registered endpoints and running deliveries.
///
/// Answers `503` once the engine has started shutting down.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(engine): State<WebhookEngine>,
) -> Result<(StatusCode, Json<MonitorStatus>)> {
    let status = MonitorStatus::from(engine.health().await?);

    let status_code = if status.is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        endpoints = status.endpoints,
        in_flight = status.in_flight,
        status_code = status_code.as_u16(),
        "Health status prepared",
    );

    Ok((status_code, Json(status)))
}

/// Returns a [`Router`] with the health route.
pub fn routes() -> Router<ServiceState> {
    use axum::routing::get;

    Router::new().route("/health", get(health_status))
}
