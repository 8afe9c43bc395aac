//! Delivery log maintenance handler.

use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use herald_webhook::WebhookEngine;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::CleanupRequest;
use crate::handler::response::CleanupResult;
use crate::service::ServiceState;

/// Tracing target for maintenance operations.
const TRACING_TARGET: &str = "herald_server::handler::maintenance";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Deletes delivery records older than the retention window.
#[tracing::instrument(skip_all, fields(retention_days = ?request.retention_days))]
async fn cleanup(
    State(engine): State<WebhookEngine>,
    ValidateJson(request): ValidateJson<CleanupRequest>,
) -> Result<(StatusCode, Json<CleanupResult>)> {
    let deleted = match request.retention_days {
        Some(days) => {
            let retention = Duration::from_secs(u64::from(days) * SECS_PER_DAY);
            engine.purge_deliveries(retention).await?
        }
        None => engine.purge_expired().await?,
    };

    tracing::info!(
        target: TRACING_TARGET,
        deleted,
        "Manual cleanup finished",
    );

    Ok((StatusCode::OK, Json(CleanupResult { deleted })))
}

/// Returns routes for maintenance operations.
pub fn routes() -> Router<ServiceState> {
    use axum::routing::post;

    Router::new().route("/maintenance/cleanup", post(cleanup))
}
