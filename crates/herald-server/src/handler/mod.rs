//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use herald_server::handler::routes;
//! use herald_server::service::{ServiceConfig, ServiceState};
//!
//! # fn example() -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&ServiceConfig::default())?;
//! let router: axum::Router = routes().with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod deliveries;
mod endpoints;
mod error;
mod events;
mod maintenance;
mod monitors;
pub mod request;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::ErrorResponse;
use crate::service::ServiceState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with every route of the management API.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(endpoints::routes())
        .merge(events::routes())
        .merge(deliveries::routes())
        .merge(maintenance::routes())
        .merge(monitors::routes())
        .fallback(fallback)
}
