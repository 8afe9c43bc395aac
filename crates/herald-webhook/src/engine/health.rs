//! Endpoint health bookkeeping.

use jiff::Timestamp;

use crate::types::{Endpoint, EndpointStatus};

/// Consecutive failed attempts after which an endpoint is suspended.
pub const SUSPENSION_THRESHOLD: u32 = 10;

/// Result of one HTTP attempt, as seen by the endpoint's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The endpoint answered with a 2xx status.
    Success {
        /// Time of the attempt.
        at: Timestamp,
    },
    /// The attempt failed.
    Failure {
        /// Time of the attempt.
        at: Timestamp,
        /// Truncated failure description.
        message: String,
    },
}

impl AttemptOutcome {
    /// Returns whether the attempt succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Status change caused by folding an outcome into an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    /// The status did not change.
    Unchanged,
    /// The endpoint crossed the failure threshold and was suspended.
    Suspended,
}

/// Applies one attempt outcome to `endpoint`.
///
/// Must be called exactly once per attempt. The suspension check runs after
/// every failure, whatever the endpoint's current status.
pub fn apply(endpoint: &mut Endpoint, outcome: &AttemptOutcome) -> HealthTransition {
    let stats = &mut endpoint.stats;
    stats.total_deliveries += 1;

    match outcome {
        AttemptOutcome::Success { at } => {
            stats.successful_deliveries += 1;
            stats.consecutive_failures = 0;
            endpoint.last_success_at = Some(*at);
            endpoint.updated_at = *at;
            HealthTransition::Unchanged
        }
        AttemptOutcome::Failure { at, message } => {
            stats.failed_deliveries += 1;
            stats.consecutive_failures = stats.consecutive_failures.saturating_add(1);
            endpoint.last_failure_at = Some(*at);
            endpoint.last_error_message = Some(message.clone());
            endpoint.updated_at = *at;

            if stats.consecutive_failures >= SUSPENSION_THRESHOLD && !endpoint.status.is_suspended()
            {
                endpoint.status = EndpointStatus::Suspended;
                HealthTransition::Suspended
            } else {
                HealthTransition::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewEndpoint;

    fn endpoint() -> Endpoint {
        NewEndpoint::new("Payments", "https://example.com/hooks")
            .with_event("payment.failed")
            .into_endpoint()
            .unwrap()
    }

    fn failure() -> AttemptOutcome {
        AttemptOutcome::Failure {
            at: Timestamp::now(),
            message: "HTTP 500: boom".into(),
        }
    }

    #[test]
    fn success_resets_streak() {
        let mut endpoint = endpoint();
        apply(&mut endpoint, &failure());
        apply(&mut endpoint, &failure());
        apply(&mut endpoint, &AttemptOutcome::Success { at: Timestamp::now() });

        assert_eq!(endpoint.stats.total_deliveries, 3);
        assert_eq!(endpoint.stats.failed_deliveries, 2);
        assert_eq!(endpoint.stats.successful_deliveries, 1);
        assert_eq!(endpoint.stats.consecutive_failures, 0);
        assert!(endpoint.last_success_at.is_some());
        assert_eq!(endpoint.last_error_message.as_deref(), Some("HTTP 500: boom"));
    }

    #[test]
    fn suspends_on_tenth_consecutive_failure() {
        let mut endpoint = endpoint();

        for _ in 1..SUSPENSION_THRESHOLD {
            assert_eq!(apply(&mut endpoint, &failure()), HealthTransition::Unchanged);
        }
        assert_eq!(endpoint.status, EndpointStatus::Active);

        assert_eq!(apply(&mut endpoint, &failure()), HealthTransition::Suspended);
        assert_eq!(endpoint.status, EndpointStatus::Suspended);

        // Further failures keep it suspended without reporting a new transition.
        assert_eq!(apply(&mut endpoint, &failure()), HealthTransition::Unchanged);
        assert_eq!(endpoint.stats.consecutive_failures, SUSPENSION_THRESHOLD + 1);
    }

    #[test]
    fn inactive_endpoint_is_still_suspended() {
        let mut endpoint = endpoint();
        endpoint.status = EndpointStatus::Inactive;
        endpoint.stats.consecutive_failures = SUSPENSION_THRESHOLD - 1;

        assert_eq!(apply(&mut endpoint, &failure()), HealthTransition::Suspended);
        assert_eq!(endpoint.status, EndpointStatus::Suspended);
    }

    #[test]
    fn success_does_not_reactivate() {
        let mut endpoint = endpoint();
        endpoint.status = EndpointStatus::Suspended;

        apply(&mut endpoint, &AttemptOutcome::Success { at: Timestamp::now() });
        assert_eq!(endpoint.status, EndpointStatus::Suspended);
    }
}
