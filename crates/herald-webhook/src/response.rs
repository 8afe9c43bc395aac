//! HTTP response returned by a transport.

use std::collections::HashMap;
use std::time::Duration;

use jiff::Timestamp;
use uuid::Uuid;

/// Response received for a webhook attempt.
///
/// Any status code is represented here; transports return an error only when
/// no response was received at all.
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    /// Request ID this response corresponds to.
    pub request_id: Uuid,
    /// HTTP status code from the webhook endpoint.
    pub status_code: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body, decoded lossily as UTF-8.
    pub body: String,
    /// Timestamp when the request was initiated.
    pub started_at: Timestamp,
    /// Time between sending the request and reading the body.
    pub elapsed: Duration,
}

impl WebhookResponse {
    /// Creates a response with an empty body.
    pub fn new(request_id: Uuid, status_code: u16) -> Self {
        Self {
            request_id,
            status_code,
            headers: HashMap::new(),
            body: String::new(),
            started_at: Timestamp::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// Sets the response body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the round-trip time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Returns whether the delivery was successful (2xx status code).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns the round-trip time in whole milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}
