#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use herald_server::handler::routes;
use herald_server::middleware::{RouterObservabilityExt, RouterRecoveryExt};
use herald_server::service::ServiceState;
use herald_server::worker::RetentionWorker;
use herald_webhook::WebhookEngine;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Cli, ServerConfig};
use crate::server::{ServerError, serve_http, shutdown_signal};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "herald_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "herald_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "herald_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    cli.init_tracing();

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting herald server"
    );

    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service).context("failed to create service state")?;
    let engine = state.engine.clone();

    let cancel = CancellationToken::new();
    let worker = spawn_retention_worker(&engine, &cancel);

    let router = create_router(state, &cli.server);
    let served = serve_http(router, &cli.server, shutdown_signal())
        .await
        .inspect_err(log_server_error);

    cancel.cancel();
    if let Some(worker) = worker
        && let Err(err) = worker.await
    {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            "retention worker task failed"
        );
    }

    drain_engine(&engine, &cli.server).await;

    served.context("HTTP server failed")
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, server: &ServerConfig) -> Router {
    routes()
        .with_state(state)
        .with_observability()
        .with_recovery(&server.recovery())
}

/// Spawns the periodic retention sweep unless it is disabled.
fn spawn_retention_worker(
    engine: &WebhookEngine,
    cancel: &CancellationToken,
) -> Option<JoinHandle<()>> {
    let Some(worker) = RetentionWorker::from_engine(engine.clone()) else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "periodic delivery cleanup is disabled"
        );
        return None;
    };

    let cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        // The worker logs its own failures.
        let _ = worker.run(cancel).await;
    });

    Some(handle)
}

/// Cancels scheduled retries and waits for in-flight attempts.
async fn drain_engine(engine: &WebhookEngine, server: &ServerConfig) {
    let timeout = server.shutdown_timeout();

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        in_flight = engine.in_flight(),
        timeout_secs = timeout.as_secs(),
        "draining delivery engine"
    );

    if tokio::time::timeout(timeout, engine.shutdown()).await.is_err() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            in_flight = engine.in_flight(),
            "shutdown timeout elapsed with deliveries still in flight"
        );
    }
}

fn log_server_error(error: &ServerError) {
    tracing::error!(
        target: TRACING_TARGET_SERVER_STARTUP,
        error = %error,
        code = error.error_code(),
        recoverable = error.is_recoverable(),
        suggestion = error.suggestion().unwrap_or_default(),
        "server failed"
    );
}
