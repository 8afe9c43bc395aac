//! The delivery engine.
//!
//! [`WebhookEngine`] resolves subscribers for triggered events, persists one
//! [`DeliveryRecord`] per endpoint and runs each delivery as an independent
//! task: attempt, classify, update the endpoint's health, then either finish
//! or sleep for the backoff delay and try again.
//!
//! Retry timers live in process memory. They are cancelled on [`shutdown`]
//! and by manual retries, but not when an endpoint is deleted or suspended.
//! A deleted endpoint's sequences stop at their next attempt; a suspended
//! endpoint's sequences run to their attempt ceiling.
//!
//! [`DeliveryRecord`]: crate::types::DeliveryRecord
//! [`shutdown`]: WebhookEngine::shutdown

mod config;
mod dispatcher;
mod executor;
pub(crate) mod health;
mod maintenance;
mod registry;
mod retry;

use std::fmt;
use std::sync::Arc;

use tokio_util::task::TaskTracker;

pub use self::config::{DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_RETENTION_DAYS, EngineConfig};
pub use self::dispatcher::{DispatchSummary, TriggerEvent};
pub use self::executor::{
    MAX_ERROR_EXCERPT_CHARS, MAX_ERROR_MESSAGE_CHARS, MAX_RESPONSE_BODY_CHARS,
};
pub use self::health::{AttemptOutcome, HealthTransition, SUSPENSION_THRESHOLD};
pub use self::maintenance::EngineHealth;
pub use self::retry::{BASE_DELAY, MAX_DELAY, backoff_delay, should_retry};
use self::retry::RetryHandles;
use crate::store::WebhookStore;
use crate::{Error, Result, WebhookService};

/// Tracing target for delivery engine operations.
pub const TRACING_TARGET: &str = "herald_webhook::engine";

struct EngineInner {
    store: Arc<dyn WebhookStore>,
    transport: WebhookService,
    config: EngineConfig,
    tracker: TaskTracker,
    retries: RetryHandles,
}

/// Webhook delivery engine.
///
/// Cheap to clone; clones share the registry, the transport and the set of
/// running deliveries.
#[derive(Clone)]
pub struct WebhookEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for WebhookEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookEngine")
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.tracker.len())
            .finish_non_exhaustive()
    }
}

impl WebhookEngine {
    /// Creates an engine over a registry and a transport.
    pub fn new<S>(store: S, transport: WebhookService, config: EngineConfig) -> Self
    where
        S: WebhookStore + 'static,
    {
        Self::from_shared(Arc::new(store), transport, config)
    }

    /// Creates an engine over a shared registry.
    pub fn from_shared(
        store: Arc<dyn WebhookStore>,
        transport: WebhookService,
        config: EngineConfig,
    ) -> Self {
        let inner = EngineInner {
            store,
            transport,
            config,
            tracker: TaskTracker::new(),
            retries: RetryHandles::new(),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the number of attempt sequences running or waiting for a retry.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Waits until every running attempt sequence, retries included, has ended.
    pub async fn wait_idle(&self) {
        let tracker = &self.inner.tracker;
        tracker.close();
        tracker.wait().await;
        if !self.inner.retries.is_cancelled() {
            tracker.reopen();
        }
    }

    /// Fails once [`shutdown`] has started, before anything is persisted.
    ///
    /// [`shutdown`]: Self::shutdown
    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.inner.retries.is_cancelled() {
            return Err(Error::unavailable().with_message("Delivery engine is shutting down"));
        }
        Ok(())
    }

    /// Cancels all scheduled retries and waits for in-flight attempts to finish.
    ///
    /// Records waiting for a retry stay in `RETRYING`; they can be resumed
    /// with a manual retry.
    pub async fn shutdown(&self) {
        tracing::info!(
            target: TRACING_TARGET,
            in_flight = self.in_flight(),
            "Shutting down delivery engine"
        );

        self.inner.retries.cancel_all();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;

        tracing::info!(
            target: TRACING_TARGET,
            "Delivery engine stopped"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use uuid::Uuid;

    use super::*;
    use crate::mock::MockProvider;
    use crate::store::MemoryStore;
    use crate::types::{DeliveryStatus, Endpoint, NewEndpoint};

    /// Engine wired to an in-memory store and a scripted transport.
    pub(crate) struct Harness {
        pub engine: WebhookEngine,
        pub store: MemoryStore,
        pub mock: MockProvider,
    }

    impl Harness {
        pub fn new(mock: MockProvider) -> Self {
            let store = MemoryStore::new();
            let engine = WebhookEngine::new(store.clone(), mock.service(), EngineConfig::default());
            Self {
                engine,
                store,
                mock,
            }
        }

        pub async fn endpoint(&self, new: NewEndpoint) -> Endpoint {
            self.engine.register_endpoint(new).await.unwrap()
        }

        pub async fn trigger(&self, event: &str) -> DispatchSummary {
            self.engine
                .trigger(TriggerEvent::new(event, serde_json::json!({"ok": true})))
                .await
                .unwrap()
        }

        pub async fn settle(&self) {
            self.engine.wait_idle().await;
        }

        /// Yields to the delivery tasks without advancing the paused clock.
        pub async fn wait_for_status(&self, delivery_id: Uuid, status: DeliveryStatus) {
            while self.engine.delivery(delivery_id).await.unwrap().status != status {
                tokio::task::yield_now().await;
            }
        }
    }

    pub(crate) fn new_endpoint(event: &str) -> NewEndpoint {
        NewEndpoint::new("Receiver", "https://receiver.example.com/hooks").with_event(event)
    }
}
