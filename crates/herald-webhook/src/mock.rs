//! Scripted in-process transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::{Error, Result, WebhookProvider, WebhookRequest, WebhookResponse, WebhookService};

/// How the mock answers one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Respond with a status code and body.
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Fail as if the connection was refused.
    NetworkError,
    /// Fail as if the request timed out.
    Timeout,
}

impl MockReply {
    /// Responds with `status` and an empty body.
    pub fn status(status: u16) -> Self {
        Self::Response {
            status,
            body: String::new(),
        }
    }

    /// Replaces the response body. No effect on error replies.
    pub fn with_body(self, body: impl Into<String>) -> Self {
        match self {
            Self::Response { status, .. } => Self::Response {
                status,
                body: body.into(),
            },
            other => other,
        }
    }
}

#[derive(Debug)]
struct MockState {
    script: VecDeque<MockReply>,
    fallback: MockReply,
    received: Vec<(Instant, WebhookRequest)>,
}

/// Transport that answers from a script and records every request.
///
/// Replies queued with [`MockProvider::then`] are used in order; once the
/// script is exhausted every request gets the fallback reply. Clones share
/// the script and the recorded requests.
#[derive(Debug, Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::always(MockReply::status(200))
    }
}

impl MockProvider {
    /// Creates a mock that answers `200 OK` unless scripted otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that always gives `reply`.
    pub fn always(reply: MockReply) -> Self {
        let state = MockState {
            script: VecDeque::new(),
            fallback: reply,
            received: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Queues a reply.
    #[must_use]
    pub fn then(self, reply: MockReply) -> Self {
        self.lock().script.push_back(reply);
        self
    }

    /// Replaces the reply given once the script is exhausted.
    pub fn set_fallback(&self, reply: MockReply) {
        self.lock().fallback = reply;
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.lock().received.iter().map(|(_, r)| r.clone()).collect()
    }

    /// Returns the tokio clock reading at which each request arrived.
    pub fn request_times(&self) -> Vec<Instant> {
        self.lock().received.iter().map(|(at, _)| *at).collect()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.lock().received.len()
    }

    /// Wraps a clone of this mock into a [`WebhookService`].
    pub fn service(&self) -> WebhookService {
        WebhookService::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl WebhookProvider for MockProvider {
    async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let reply = {
            let mut state = self.lock();
            state.received.push((Instant::now(), request.clone()));
            match state.script.pop_front() {
                Some(reply) => reply,
                None => state.fallback.clone(),
            }
        };

        match reply {
            MockReply::Response { status, body } => {
                let response = WebhookResponse::new(request.request_id, status)
                    .with_body(body)
                    .with_header("content-type", "text/plain")
                    .with_elapsed(Duration::from_millis(12));
                Ok(response)
            }
            MockReply::NetworkError => {
                Err(Error::network_error().with_message("Connection refused"))
            }
            MockReply::Timeout => Err(Error::timeout().with_message("Request timed out")),
        }
    }
}
