//! Delivery log retention worker.
//!
//! Periodically deletes delivery records older than the retention window.

use std::time::Duration;

use herald_webhook::WebhookEngine;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Tracing target for retention worker operations.
const TRACING_TARGET: &str = "herald_server::worker::retention";

/// Retention worker.
///
/// Runs a cleanup sweep every `interval` until cancelled. The first sweep
/// happens one interval after start.
#[derive(Debug, Clone)]
pub struct RetentionWorker {
    engine: WebhookEngine,
    interval: Duration,
    retention: Duration,
}

impl RetentionWorker {
    /// Creates a worker sweeping with the engine's retention window.
    pub fn new(engine: WebhookEngine, interval: Duration) -> Self {
        let retention = engine.config().retention();
        Self {
            engine,
            interval,
            retention,
        }
    }

    /// Creates a worker from the engine configuration.
    ///
    /// Returns `None` when periodic cleanup is disabled.
    pub fn from_engine(engine: WebhookEngine) -> Option<Self> {
        let interval = engine.config().cleanup_interval()?;
        Some(Self::new(engine, interval))
    }

    /// Overrides the retention window.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Returns the interval between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the retention worker until cancelled.
    ///
    /// A failed sweep is logged and retried at the next tick.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            interval_secs = self.interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "Starting retention worker"
        );

        let result = self.run_inner(cancel).await;

        match &result {
            Ok(()) => {
                tracing::info!(target: TRACING_TARGET, "Retention worker stopped");
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Retention worker failed"
                );
            }
        }

        result
    }

    async fn run_inner(&self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        "Retention worker shutdown requested"
                    );
                    break;
                }
                _ = ticker.tick() => self.sweep().await,
            }
        }

        Ok(())
    }

    async fn sweep(&self) {
        match self.engine.purge_deliveries(self.retention).await {
            Ok(deleted) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    deleted,
                    "Retention sweep finished"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Retention sweep failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use herald_webhook::mock::MockProvider;
    use herald_webhook::types::NewEndpoint;
    use herald_webhook::{EngineConfig, ErrorKind, MemoryStore, TriggerEvent};
    use serde_json::json;

    use super::*;

    fn engine(config: EngineConfig) -> WebhookEngine {
        WebhookEngine::new(MemoryStore::new(), MockProvider::new().service(), config)
    }

    #[test]
    fn disabled_cleanup_has_no_worker() {
        let config = EngineConfig::default().with_cleanup_interval_secs(0);
        assert!(RetentionWorker::from_engine(engine(config)).is_none());

        let worker = RetentionWorker::from_engine(engine(EngineConfig::default())).unwrap();
        assert_eq!(worker.interval(), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_until_cancelled() {
        let engine = engine(EngineConfig::default());
        engine
            .register_endpoint(
                NewEndpoint::new("Receiver", "https://receiver.example.com/hooks")
                    .with_event("order.created"),
            )
            .await
            .unwrap();

        let summary = engine
            .trigger(TriggerEvent::new("order.created", json!({})))
            .await
            .unwrap();
        engine.wait_idle().await;

        let worker =
            RetentionWorker::new(engine.clone(), Duration::from_secs(60)).with_retention(Duration::ZERO);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { worker.run(cancel).await }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(engine.delivery(summary.deliveries[0]).await.is_ok());

        tokio::time::sleep(Duration::from_secs(31)).await;
        let error = engine.delivery(summary.deliveries[0]).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
