//! Retry scheduling and manual retries.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{TRACING_TARGET, WebhookEngine};
use crate::Result;
use crate::types::DeliveryRecord;

/// Delay before the first retry.
pub const BASE_DELAY: Duration = Duration::from_secs(10);

/// Upper bound of any retry delay.
pub const MAX_DELAY: Duration = Duration::from_secs(300);

/// Growth factor between consecutive retry delays.
const BACKOFF_FACTOR: u32 = 3;

/// Returns the delay before the attempt following failed attempt number `attempt`.
///
/// Attempt 1 waits 10s, then 30s, 90s, 270s and 300s from there on.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    BACKOFF_FACTOR
        .checked_pow(exponent)
        .and_then(|factor| BASE_DELAY.checked_mul(factor))
        .map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
}

/// Returns whether a delivery that has made `attempt_count` attempts may try again.
///
/// The first attempt is always made, so a ceiling of zero behaves like one.
pub fn should_retry(attempt_count: u32, max_retries: u32) -> bool {
    attempt_count < max_retries.max(1)
}

struct Slot {
    sequence: u32,
    token: CancellationToken,
}

/// Cancellation handles of running attempt sequences, keyed by delivery id.
pub(crate) struct RetryHandles {
    root: CancellationToken,
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl RetryHandles {
    pub(crate) fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Registers attempt sequence `sequence` of a delivery, cancelling the
    /// previous sequence of the same delivery if one is still scheduled.
    pub(crate) fn register(&self, delivery_id: Uuid, sequence: u32) -> CancellationToken {
        let token = self.root.child_token();
        let slot = Slot {
            sequence,
            token: token.clone(),
        };

        let previous = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(delivery_id, slot);
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        token
    }

    /// Drops the handle of a finished sequence unless a newer one replaced it.
    pub(crate) fn release(&self, delivery_id: Uuid, sequence: u32) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(&delivery_id)
            .is_some_and(|slot| slot.sequence == sequence)
        {
            slots.remove(&delivery_id);
        }
    }

    /// Cancels every scheduled retry, present and future.
    pub(crate) fn cancel_all(&self) {
        self.root.cancel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }
}

impl WebhookEngine {
    /// Spawns the attempt sequence of a delivery.
    pub(crate) fn spawn_sequence(&self, delivery_id: Uuid, sequence: u32) {
        let token = self.inner.retries.register(delivery_id, sequence);
        let engine = self.clone();

        self.inner.tracker.spawn(async move {
            engine.run_sequence(delivery_id, sequence, token).await;
        });
    }

    async fn run_sequence(&self, delivery_id: Uuid, sequence: u32, token: CancellationToken) {
        while !token.is_cancelled() {
            match self.execute(delivery_id, sequence).await {
                Ok(None) => break,
                Ok(Some(delay)) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                delivery_id = %delivery_id,
                                sequence,
                                "Scheduled retry cancelled"
                            );
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(error) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        delivery_id = %delivery_id,
                        sequence,
                        error = %error,
                        "Delivery sequence aborted"
                    );
                    break;
                }
            }
        }

        self.inner.retries.release(delivery_id, sequence);
    }

    /// Starts a fresh attempt sequence for a delivery that did not succeed.
    ///
    /// The stored envelope is resent unchanged, so the event id and timestamp
    /// stay those of the original trigger. A scheduled retry of the previous
    /// sequence is cancelled. Deliveries that succeeded, or whose attempt is
    /// in flight, are rejected with a conflict error.
    pub async fn retry_delivery(&self, delivery_id: Uuid) -> Result<DeliveryRecord> {
        self.ensure_running()?;
        let record = self.inner.store.reset_delivery(delivery_id).await?;
        self.spawn_sequence(record.id, record.sequence);

        tracing::info!(
            target: TRACING_TARGET,
            delivery_id = %record.id,
            endpoint_id = %record.endpoint_id,
            event_id = %record.event_id,
            sequence = record.sequence,
            "Manual retry scheduled"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::engine::testing::{Harness, new_endpoint};
    use crate::mock::{MockProvider, MockReply};
    use crate::types::{DeliveryStatus, EndpointStatus};
    use crate::{ErrorKind, TriggerEvent, headers};

    #[test]
    fn backoff_sequence() {
        let delays: Vec<_> = (1..=7).map(|a| backoff_delay(a).as_secs()).collect();
        assert_eq!(delays, [10, 30, 90, 270, 300, 300, 300]);
        assert_eq!(backoff_delay(u32::MAX), MAX_DELAY);
    }

    #[test]
    fn retry_ceiling() {
        assert!(should_retry(1, 3));
        assert!(should_retry(2, 3));
        assert!(!should_retry(3, 3));
        assert!(!should_retry(1, 0));
        assert!(!should_retry(1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_endpoint_exhausts_attempts() {
        let harness = Harness::new(MockProvider::always(MockReply::status(500)));
        let endpoint = harness.endpoint(new_endpoint("order.created")).await;

        let summary = harness.trigger("order.created").await;
        harness.settle().await;

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.attempt_count, 3);
        assert!(record.next_retry_at.is_none());
        assert!(record.error_message.as_deref().unwrap().starts_with("HTTP 500: "));

        let endpoint = harness.engine.endpoint(endpoint.id).await.unwrap();
        assert_eq!(endpoint.stats.total_deliveries, 3);
        assert_eq!(endpoint.stats.failed_deliveries, 3);
        assert_eq!(endpoint.stats.consecutive_failures, 3);
        assert_eq!(endpoint.status, EndpointStatus::Active);
        assert_eq!(harness.mock.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_follow_backoff_schedule() {
        let harness = Harness::new(MockProvider::always(MockReply::status(503)));
        harness
            .endpoint(new_endpoint("order.created").with_max_retries(6))
            .await;

        harness.trigger("order.created").await;
        harness.settle().await;

        let times: Vec<Instant> = harness.mock.request_times();
        let gaps: Vec<_> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            [10, 30, 90, 270, 300].map(Duration::from_secs).to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn event_id_is_stable_across_retries() {
        let harness = Harness::new(MockProvider::always(MockReply::NetworkError));
        harness.endpoint(new_endpoint("stock.low")).await;

        let summary = harness.trigger("stock.low").await;
        harness.settle().await;

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        let requests = harness.mock.requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert_eq!(request.header(headers::EVENT_ID), Some(record.event_id.as_str()));
            assert_eq!(request.body, requests[0].body);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_failure_resets_streak() {
        let mock = MockProvider::new()
            .then(MockReply::status(502))
            .then(MockReply::status(200));
        let harness = Harness::new(mock);
        let endpoint = harness.endpoint(new_endpoint("order.paid")).await;

        let summary = harness.trigger("order.paid").await;
        harness.settle().await;

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Success);
        assert_eq!(record.attempt_count, 2);
        assert!(record.error_message.is_none());

        let endpoint = harness.engine.endpoint(endpoint.id).await.unwrap();
        assert_eq!(endpoint.stats.consecutive_failures, 0);
        assert_eq!(endpoint.stats.successful_deliveries, 1);
        assert_eq!(endpoint.stats.failed_deliveries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_last_permitted_attempt() {
        let mock = MockProvider::new()
            .then(MockReply::status(500))
            .then(MockReply::status(500))
            .then(MockReply::status(204));
        let harness = Harness::new(mock);
        harness.endpoint(new_endpoint("order.paid")).await;

        let summary = harness.trigger("order.paid").await;
        harness.settle().await;

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Success);
        assert_eq!(record.attempt_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_retries_makes_a_single_attempt() {
        let harness = Harness::new(MockProvider::always(MockReply::status(500)));
        harness
            .endpoint(new_endpoint("order.created").with_max_retries(0))
            .await;

        let summary = harness.trigger("order.created").await;
        harness.settle().await;

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.attempt_count, 1);
        assert_eq!(harness.mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_of_failed_delivery() {
        let harness = Harness::new(MockProvider::always(MockReply::status(500)));
        harness
            .endpoint(new_endpoint("order.created").with_max_retries(1))
            .await;

        let summary = harness.trigger("order.created").await;
        harness.settle().await;
        let failed = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(failed.status, DeliveryStatus::Failed);

        harness.mock.set_fallback(MockReply::status(200));
        let reset = harness.engine.retry_delivery(failed.id).await.unwrap();
        assert_eq!(reset.status, DeliveryStatus::Pending);
        assert_eq!(reset.attempt_count, 0);
        assert!(reset.error_message.is_none());
        assert_eq!(reset.event_id, failed.event_id);

        harness.settle().await;

        let record = harness.engine.delivery(failed.id).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Success);
        assert_eq!(record.attempt_count, 1);
        assert_eq!(record.event_id, failed.event_id);
        assert_eq!(record.payload, failed.payload);

        let requests = harness.mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body, requests[1].body);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_of_successful_delivery_is_rejected() {
        let harness = Harness::new(MockProvider::new());
        harness.endpoint(new_endpoint("order.created")).await;

        let summary = harness.trigger("order.created").await;
        harness.settle().await;

        let error = harness
            .engine
            .retry_delivery(summary.deliveries[0])
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(harness.mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_replaces_scheduled_retry() {
        let harness = Harness::new(MockProvider::always(MockReply::status(500)));
        harness.endpoint(new_endpoint("order.created")).await;

        let summary = harness.trigger("order.created").await;
        let id = summary.deliveries[0];
        harness.wait_for_status(id, DeliveryStatus::Retrying).await;

        harness.mock.set_fallback(MockReply::status(200));
        harness.engine.retry_delivery(id).await.unwrap();
        harness.settle().await;

        let record = harness.engine.delivery(id).await.unwrap();
        assert_eq!(record.status, DeliveryStatus::Success);
        assert_eq!(record.attempt_count, 1);
        // The cancelled timer never fired a third request.
        assert_eq!(harness.mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_of_unknown_delivery() {
        let harness = Harness::new(MockProvider::new());
        let error = harness
            .engine
            .retry_delivery(Uuid::now_v7())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn suspension_does_not_cancel_current_sequence() {
        let harness = Harness::new(MockProvider::always(MockReply::status(500)));
        let endpoint = harness
            .endpoint(new_endpoint("order.created").with_max_retries(12))
            .await;

        let summary = harness
            .engine
            .trigger(TriggerEvent::new("order.created", serde_json::json!({})))
            .await
            .unwrap();
        harness.settle().await;

        let endpoint = harness.engine.endpoint(endpoint.id).await.unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Suspended);

        let record = harness.engine.delivery(summary.deliveries[0]).await.unwrap();
        assert_eq!(record.attempt_count, 12);
        assert_eq!(record.status, DeliveryStatus::Failed);
    }
}
