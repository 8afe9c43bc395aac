//! Outbound HTTP request handed to a transport.

use std::time::Duration;

use url::Url;
use uuid::Uuid;

/// A single HTTP POST attempt, fully prepared.
///
/// The body is the serialized envelope and the headers already include the
/// engine headers, the endpoint's custom headers and the signature headers.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Unique identifier of this attempt.
    pub request_id: Uuid,
    /// Delivery target.
    pub url: Url,
    /// Headers in the order they are sent.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
    /// Abort the attempt after this long.
    pub timeout: Duration,
    /// Whether the target's TLS certificate is verified.
    pub verify_tls: bool,
}

impl WebhookRequest {
    /// Creates a request with no headers.
    pub fn new(url: Url, body: Vec<u8>, timeout: Duration) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            url,
            headers: Vec::new(),
            body,
            timeout,
            verify_tls: true,
        }
    }

    /// Appends a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets whether the target's TLS certificate is verified.
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Returns the first value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
