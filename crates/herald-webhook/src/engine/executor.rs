//! Single HTTP attempt of a delivery.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use super::health::{AttemptOutcome, HealthTransition};
use super::{TRACING_TARGET, WebhookEngine, retry};
use crate::types::{DeliveryRecord, DeliveryStatus, Endpoint, ResponseInfo};
use crate::{Result, WebhookRequest, WebhookResponse, headers, signer};

/// Longest response body kept on a delivery record, in characters.
pub const MAX_RESPONSE_BODY_CHARS: usize = 5000;

/// Longest response body excerpt quoted in a failure message, in characters.
pub const MAX_ERROR_EXCERPT_CHARS: usize = 200;

/// Longest failure message kept on records and endpoints, in characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 1000;

/// Returns `text` cut to at most `max_chars` characters.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_owned(),
        None => text.to_owned(),
    }
}

/// Builds the HTTP request of one attempt.
///
/// Custom headers that collide with engine headers are skipped. The
/// signature covers exactly the body bytes that are sent.
pub(crate) fn build_request(endpoint: &Endpoint, record: &DeliveryRecord) -> Result<WebhookRequest> {
    let body = record.payload.to_bytes()?;

    let mut request = WebhookRequest::new(endpoint.url.clone(), body, endpoint.timeout())
        .with_verify_tls(endpoint.verify_tls)
        .with_header(headers::CONTENT_TYPE, "application/json")
        .with_header(headers::WEBHOOK_ID, endpoint.id.to_string())
        .with_header(headers::EVENT_TYPE, record.event.as_str())
        .with_header(headers::EVENT_ID, record.event_id.as_str())
        .with_header(
            headers::TIMESTAMP,
            record.payload.timestamp.as_second().to_string(),
        );

    let mut custom: Vec<_> = endpoint.headers.iter().collect();
    custom.sort_unstable();
    for (name, value) in custom {
        if headers::is_reserved(name) {
            tracing::warn!(
                target: TRACING_TARGET,
                endpoint_id = %endpoint.id,
                header = %name,
                "Skipping custom header that collides with a reserved header"
            );
            continue;
        }
        request.headers.push((name.clone(), value.clone()));
    }

    if let Some(secret) = &endpoint.secret {
        for (name, value) in signer::signature_headers(secret, &request.body) {
            request.headers.push((name.to_owned(), value));
        }
    }

    Ok(request)
}

/// What one attempt produced.
#[derive(Debug)]
pub(crate) struct AttemptReport {
    /// Response metadata, if the endpoint answered.
    pub response: Option<ResponseInfo>,
    /// Failure description; `None` for a 2xx response.
    pub failure: Option<String>,
}

impl AttemptReport {
    /// Classifies a transport result. Only 2xx responses are successes.
    pub(crate) fn classify(result: Result<WebhookResponse>) -> Self {
        match result {
            Ok(response) => {
                let failure = (!response.is_success()).then(|| {
                    format!(
                        "HTTP {}: {}",
                        response.status_code,
                        truncate(&response.body, MAX_ERROR_EXCERPT_CHARS)
                    )
                });
                let info = ResponseInfo {
                    status_code: response.status_code,
                    elapsed_ms: response.elapsed_ms(),
                    body: truncate(&response.body, MAX_RESPONSE_BODY_CHARS),
                    headers: response.headers,
                };
                Self {
                    response: Some(info),
                    failure: failure.map(|m| truncate(&m, MAX_ERROR_MESSAGE_CHARS)),
                }
            }
            Err(error) => Self {
                response: None,
                failure: Some(truncate(&error.to_string(), MAX_ERROR_MESSAGE_CHARS)),
            },
        }
    }
}

impl WebhookEngine {
    /// Runs one attempt of attempt sequence `sequence` of a delivery.
    ///
    /// Returns the delay before the next attempt, or `None` when the
    /// sequence is over.
    pub(crate) async fn execute(&self, delivery_id: Uuid, sequence: u32) -> Result<Option<Duration>> {
        let store = &self.inner.store;

        let Some(mut record) = store.claim_delivery(delivery_id, sequence).await? else {
            tracing::debug!(
                target: TRACING_TARGET,
                delivery_id = %delivery_id,
                sequence,
                "Delivery is no longer owned by this sequence"
            );
            return Ok(None);
        };

        let Some(endpoint) = store.find_endpoint(record.endpoint_id).await? else {
            tracing::debug!(
                target: TRACING_TARGET,
                delivery_id = %delivery_id,
                endpoint_id = %record.endpoint_id,
                "Endpoint was deleted, abandoning delivery"
            );
            record.status = DeliveryStatus::Failed;
            record.error_message = Some("endpoint no longer exists".to_owned());
            record.updated_at = Timestamp::now();
            store.update_delivery(record).await?;
            return Ok(None);
        };

        let attempt = record.attempt_count + 1;
        let event_id = record.event_id.clone();
        tracing::debug!(
            target: TRACING_TARGET,
            delivery_id = %delivery_id,
            endpoint_id = %endpoint.id,
            event = %record.event,
            event_id = %event_id,
            attempt,
            "Attempting delivery"
        );

        let result = match build_request(&endpoint, &record) {
            Ok(request) => self.inner.transport.deliver(&request).await,
            Err(error) => Err(error),
        };
        let report = AttemptReport::classify(result);

        let now = Timestamp::now();
        let status_code = report.response.as_ref().map(|r| r.status_code);
        let elapsed_ms = report.response.as_ref().map(|r| r.elapsed_ms);

        record.attempt_count = attempt;
        record.sent_at = Some(now);
        record.updated_at = now;
        record.response = report.response;

        let (outcome, next_delay) = match report.failure {
            None => {
                record.status = DeliveryStatus::Success;
                record.error_message = None;
                record.next_retry_at = None;
                (AttemptOutcome::Success { at: now }, None)
            }
            Some(message) => {
                let next_delay = retry::should_retry(attempt, endpoint.max_retries)
                    .then(|| retry::backoff_delay(attempt));

                match next_delay {
                    Some(delay) => {
                        record.status = DeliveryStatus::Retrying;
                        record.next_retry_at = now
                            .checked_add(SignedDuration::from_secs(delay.as_secs() as i64))
                            .ok();
                    }
                    None => {
                        record.status = DeliveryStatus::Failed;
                        record.next_retry_at = None;
                    }
                }
                record.error_message = Some(message.clone());
                (AttemptOutcome::Failure { at: now, message }, next_delay)
            }
        };

        let transition = store.record_endpoint_attempt(endpoint.id, &outcome).await?;
        let status = record.status;
        let next_retry_at = record.next_retry_at;
        let error_message = record.error_message.clone();
        store.update_delivery(record).await?;

        match &outcome {
            AttemptOutcome::Success { .. } => {
                tracing::info!(
                    target: TRACING_TARGET,
                    delivery_id = %delivery_id,
                    endpoint_id = %endpoint.id,
                    event_id = %event_id,
                    attempt,
                    status_code,
                    elapsed_ms,
                    "Webhook delivered"
                );
            }
            AttemptOutcome::Failure { .. } => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    delivery_id = %delivery_id,
                    endpoint_id = %endpoint.id,
                    event_id = %event_id,
                    attempt,
                    status_code,
                    elapsed_ms,
                    status = %status,
                    next_retry_at = ?next_retry_at,
                    delay_secs = next_delay.map(|d| d.as_secs()),
                    error = error_message.as_deref().unwrap_or_default(),
                    "Webhook delivery attempt failed"
                );
            }
        }

        if transition == Some(HealthTransition::Suspended) {
            tracing::warn!(
                target: TRACING_TARGET,
                endpoint_id = %endpoint.id,
                url = %endpoint.url,
                "Endpoint suspended after repeated delivery failures"
            );
        }

        Ok(next_delay)
    }
}
