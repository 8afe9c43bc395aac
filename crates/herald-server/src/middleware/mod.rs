//! Middleware for `axum::Router`.
//!
//! - Observability: request IDs, tracing spans, sensitive header redaction
//! - Recovery: handler panics, request timeouts, tower service errors
//!
//! ```rust,no_run
//! use axum::Router;
//! use herald_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
//!
//! let app: Router = Router::new()
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::with_timeout_secs(30));
//! ```

mod observability;
mod recovery;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
