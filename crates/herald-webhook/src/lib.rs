#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod service;

pub mod engine;
pub mod headers;
pub mod payload;
pub mod request;
pub mod response;
pub mod signer;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use engine::{DispatchSummary, EngineConfig, EngineHealth, TriggerEvent, WebhookEngine};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use payload::Envelope;
pub use request::WebhookRequest;
pub use response::WebhookResponse;
pub use service::WebhookService;
pub use store::{DeliveryRepository, EndpointRepository, MemoryStore, WebhookStore};

/// Tracing target for webhook transport operations.
pub const TRACING_TARGET: &str = "herald_webhook::transport";

/// Core trait for outbound webhook transports.
///
/// Implement this trait to plug in a custom HTTP client. A transport sends
/// exactly one request and returns whatever status the endpoint answered
/// with; it fails only when no response was received.
#[async_trait::async_trait]
pub trait WebhookProvider: Send + Sync {
    /// Sends one webhook request.
    async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse>;
}
