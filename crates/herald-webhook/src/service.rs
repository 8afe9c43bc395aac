//! Webhook transport wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{Result, TRACING_TARGET, WebhookProvider, WebhookRequest, WebhookResponse};

/// Transport wrapper with observability.
///
/// This wrapper adds structured logging to any webhook delivery implementation.
/// The inner provider is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct WebhookService {
    inner: Arc<dyn WebhookProvider>,
}

impl fmt::Debug for WebhookService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookService").finish_non_exhaustive()
    }
}

impl WebhookService {
    /// Create a new webhook service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: WebhookProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Sends one attempt through the wrapped provider.
    pub async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            url = %request.url,
            timeout_ms = request.timeout.as_millis(),
            verify_tls = request.verify_tls,
            "Sending webhook request"
        );

        let result = self.inner.deliver(request).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(response) if response.is_success() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    status_code = response.status_code,
                    elapsed_ms = elapsed.as_millis(),
                    "Webhook request acknowledged"
                );
            }
            Ok(response) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    status_code = response.status_code,
                    elapsed_ms = elapsed.as_millis(),
                    "Webhook request rejected by endpoint"
                );
            }
            Err(error) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Webhook request failed"
                );
            }
        }

        result
    }
}
