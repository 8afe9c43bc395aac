//! Delivery log retention and engine health.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use super::{TRACING_TARGET, WebhookEngine};
use crate::{Error, Result};

/// Snapshot of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineHealth {
    /// Number of registered endpoints.
    pub endpoints: usize,
    /// Attempt sequences currently running or waiting for a retry.
    pub in_flight: usize,
    /// Whether shutdown has started.
    pub shutting_down: bool,
}

impl WebhookEngine {
    /// Deletes delivery records created more than `retention` ago.
    ///
    /// Returns the number of records removed.
    pub async fn purge_deliveries(&self, retention: Duration) -> Result<u64> {
        let seconds = i64::try_from(retention.as_secs()).unwrap_or(i64::MAX);
        let cutoff = Timestamp::now()
            .checked_sub(SignedDuration::from_secs(seconds))
            .map_err(|error| {
                Error::invalid_input()
                    .with_message("retention window is too large")
                    .with_source(error)
            })?;

        let deleted = self.inner.store.purge_deliveries(cutoff).await?;

        tracing::info!(
            target: TRACING_TARGET,
            cutoff = %cutoff,
            deleted,
            "Delivery records purged"
        );

        Ok(deleted)
    }

    /// Deletes delivery records older than the configured retention window.
    pub async fn purge_expired(&self) -> Result<u64> {
        self.purge_deliveries(self.inner.config.retention()).await
    }

    /// Reports the number of endpoints and running attempt sequences.
    pub async fn health(&self) -> Result<EngineHealth> {
        Ok(EngineHealth {
            endpoints: self.inner.store.count_endpoints().await?,
            in_flight: self.in_flight(),
            shutting_down: self.inner.retries.is_cancelled(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::engine::testing::{Harness, new_endpoint};
    use crate::mock::{MockProvider, MockReply};
    use crate::store::DeliveryRepository;
    use crate::types::{DeliveryFilter, DeliveryStatus};

    #[tokio::test(start_paused = true)]
    async fn purge_respects_retention_window() {
        let harness = Harness::new(MockProvider::new());
        harness.endpoint(new_endpoint("order.created")).await;

        let old = harness.trigger("order.created").await.deliveries[0];
        let fresh = harness.trigger("order.created").await.deliveries[0];
        harness.settle().await;

        let mut record = harness.engine.delivery(old).await.unwrap();
        record.created_at = Timestamp::now()
            .checked_sub(SignedDuration::from_hours(24 * 31))
            .unwrap();
        harness.store.update_delivery(record).await.unwrap();

        let deleted = harness.engine.purge_expired().await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = harness
            .engine
            .list_deliveries(&DeliveryFilter::default())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retention_purges_everything() {
        let harness = Harness::new(MockProvider::new());
        harness.endpoint(new_endpoint("order.created")).await;
        harness.trigger("order.created").await;
        harness.settle().await;

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(harness.engine.purge_deliveries(Duration::ZERO).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn oversized_retention_is_rejected() {
        let harness = Harness::new(MockProvider::new());
        let error = harness
            .engine
            .purge_deliveries(Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test(start_paused = true)]
    async fn health_counts_running_sequences() {
        let harness = Harness::new(MockProvider::always(MockReply::status(500)));
        harness.endpoint(new_endpoint("order.created")).await;

        let id = harness.trigger("order.created").await.deliveries[0];
        harness.wait_for_status(id, DeliveryStatus::Retrying).await;

        let health = harness.engine.health().await.unwrap();
        assert_eq!(health.endpoints, 1);
        assert_eq!(health.in_flight, 1);
        assert!(!health.shutting_down);

        harness.engine.shutdown().await;

        let health = harness.engine.health().await.unwrap();
        assert_eq!(health.in_flight, 0);
        assert!(health.shutting_down);
        assert_eq!(harness.mock.request_count(), 1);
    }
}
