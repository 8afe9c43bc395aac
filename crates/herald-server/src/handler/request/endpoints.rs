//! Endpoint management request types.

use std::collections::HashMap;

use herald_webhook::types::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, EndpointStatus, NewEndpoint, SigningSecret,
    UpdateEndpoint as UpdateEndpointModel,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for registering a new endpoint.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEndpoint {
    /// Tenant the endpoint belongs to.
    pub tenant_id: Option<String>,
    /// Human-readable name for the endpoint (1-100 characters).
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// The URL to send webhook payloads to.
    #[validate(url, length(min = 1, max = 2048))]
    pub url: String,
    /// Event types this endpoint should receive.
    #[validate(length(min = 1))]
    pub events: Vec<String>,
    /// Signing secret. Generated when omitted.
    pub secret: Option<String>,
    /// Set to `false` to send deliveries unsigned. Ignored when `secret` is given.
    pub signed: Option<bool>,
    /// Custom headers to include in webhook requests.
    pub headers: Option<HashMap<String, String>>,
    /// Maximum number of HTTP attempts per delivery (0-20).
    #[validate(range(max = 20))]
    pub max_retries: Option<u32>,
    /// Per-attempt timeout in seconds (1-300).
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: Option<u64>,
    /// Whether to verify the endpoint's TLS certificate.
    pub verify_tls: Option<bool>,
    /// Initial status of the endpoint.
    pub status: Option<EndpointStatus>,
}

impl CreateEndpoint {
    /// Converts this request into a registration payload.
    pub fn into_model(self) -> NewEndpoint {
        let secret = match (self.secret, self.signed) {
            (Some(secret), _) => SigningSecret::Provided(secret),
            (None, Some(false)) => SigningSecret::Disabled,
            (None, _) => SigningSecret::Generate,
        };

        NewEndpoint {
            tenant_id: self.tenant_id,
            name: self.name,
            url: self.url,
            events: self.events,
            secret,
            headers: self.headers.unwrap_or_default(),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            verify_tls: self.verify_tls.unwrap_or(true),
            status: self.status.unwrap_or_default(),
        }
    }
}

/// Request payload for updating an existing endpoint.
///
/// Omitted fields are left unchanged.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEndpoint {
    /// Updated name (1-100 characters).
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Updated delivery URL.
    #[validate(url, length(min = 1, max = 2048))]
    pub url: Option<String>,
    /// Replacement list of event types.
    #[validate(length(min = 1))]
    pub events: Option<Vec<String>>,
    /// Replacement set of custom headers.
    pub headers: Option<HashMap<String, String>>,
    /// Updated status. Setting `ACTIVE` clears the failure streak.
    pub status: Option<EndpointStatus>,
    /// Updated attempt ceiling (0-20).
    #[validate(range(max = 20))]
    pub max_retries: Option<u32>,
    /// Updated per-attempt timeout in seconds (1-300).
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: Option<u64>,
    /// Updated TLS verification flag.
    pub verify_tls: Option<bool>,
}

impl UpdateEndpoint {
    /// Converts this request into an endpoint change set.
    pub fn into_model(self) -> UpdateEndpointModel {
        UpdateEndpointModel {
            name: self.name,
            url: self.url,
            events: self.events,
            headers: self.headers,
            status: self.status,
            max_retries: self.max_retries,
            timeout_secs: self.timeout_secs,
            verify_tls: self.verify_tls,
        }
    }
}

/// Query parameters for listing endpoints.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEndpointsQuery {
    /// Only list endpoints of this tenant.
    pub tenant_id: Option<String>,
}
