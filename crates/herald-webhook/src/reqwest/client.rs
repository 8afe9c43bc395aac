//! Reqwest-based HTTP client for webhook delivery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use jiff::Timestamp;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{Error, ReqwestConfig, Result, TRACING_TARGET};
use crate::{WebhookProvider, WebhookRequest, WebhookResponse, WebhookService};

/// Inner client that holds the HTTP clients and configuration.
struct ReqwestClientInner {
    http: Client,
    insecure: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for delivering webhook payloads to external endpoints.
///
/// Two connection pools are kept: one verifying TLS certificates and one that
/// accepts any certificate, used for endpoints registered with TLS
/// verification turned off.
///
/// # Examples
///
/// ```rust,ignore
/// use herald_webhook::reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::default())?;
/// let service = client.into_service();
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let user_agent = config.resolved_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ceiling_secs = config.timeout_ceiling().map(|t| t.as_secs()),
            max_response_bytes = config.max_response_bytes,
            user_agent = %user_agent,
            "Creating reqwest client"
        );

        let builder = || {
            let builder = Client::builder().user_agent(&user_agent);
            match config.timeout_ceiling() {
                Some(ceiling) => builder.timeout(ceiling),
                None => builder,
            }
        };

        let http = builder().build().map_err(Error::Build)?;
        let insecure = builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(Error::Build)?;

        let inner = ReqwestClientInner {
            http,
            insecure,
            config,
        };

        tracing::info!(
            target: TRACING_TARGET,
            "Reqwest client created successfully"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`WebhookService`] for use with dependency injection.
    pub fn into_service(self) -> WebhookService {
        WebhookService::new(self)
    }

    fn http(&self, verify_tls: bool) -> &Client {
        if verify_tls {
            &self.inner.http
        } else {
            &self.inner.insecure
        }
    }

    async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let started_at = Timestamp::now();
        let clock = Instant::now();

        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let invalid = || Error::InvalidHeader(name.clone());
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| invalid())?;
            headers.append(header_name, header_value);
        }

        let mut http_response = self
            .http(request.verify_tls)
            .post(request.url.as_str())
            .timeout(self.inner.config.attempt_timeout(request.timeout))
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await?;

        let status_code = http_response.status().as_u16();
        let headers: HashMap<String, String> = http_response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        // The attempt timeout also covers the body: a stalled body fails the attempt.
        let limit = self.inner.config.max_response_bytes;
        let mut body = Vec::new();
        while body.len() < limit {
            let Some(chunk) = http_response.chunk().await.map_err(Error::Body)? else {
                break;
            };
            body.extend_from_slice(&chunk);
        }
        if body.len() >= limit {
            body.truncate(limit);
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %request.request_id,
                limit,
                "Response body cut at the read limit"
            );
        }

        Ok(WebhookResponse {
            request_id: request.request_id,
            status_code,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
            started_at,
            elapsed: clock.elapsed(),
        })
    }
}

#[async_trait::async_trait]
impl WebhookProvider for ReqwestClient {
    async fn deliver(&self, request: &WebhookRequest) -> crate::Result<WebhookResponse> {
        tracing::trace!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            url = %request.url,
            body_len = request.body.len(),
            "Posting webhook"
        );

        Ok(self.send(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ReqwestClient::new(ReqwestConfig::default()).unwrap();
        assert!(client.config().user_agent.is_none());

        let uncapped = ReqwestClient::new(ReqwestConfig::default().with_http_timeout(0));
        assert!(uncapped.is_ok());
    }

    #[test]
    fn test_client_is_cheap_to_clone() {
        let client = ReqwestClient::new(ReqwestConfig::default().with_http_timeout(5)).unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &clone.inner));
    }
}
