//! Application state and dependency injection.

mod config;

use herald_webhook::reqwest::ReqwestClient;
use herald_webhook::{MemoryStore, WebhookEngine};

pub use crate::service::config::ServiceConfig;
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub engine: WebhookEngine,
}

impl ServiceState {
    /// Wraps an already assembled engine.
    pub fn new(engine: WebhookEngine) -> Self {
        Self { engine }
    }

    /// Builds the reqwest transport and an engine over an in-memory registry.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let client = ReqwestClient::new(config.http_client.clone())
            .map_err(|e| Error::config("failed to build the HTTP client").with_source(e))?;
        let engine = WebhookEngine::new(
            MemoryStore::new(),
            client.into_service(),
            config.engine.clone(),
        );

        Ok(Self::new(engine))
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(engine: WebhookEngine);
