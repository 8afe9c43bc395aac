//! Webhook endpoint model and its creation/update payloads.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{EndpointStatus, EventType};
use crate::{Error, Result, headers, signer};

/// Default number of attempts per delivery.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound accepted for `max_retries`.
pub const MAX_MAX_RETRIES: u32 = 20;

/// Default per-attempt timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound accepted for `timeout_secs`.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Maximum length of an endpoint display name.
pub const MAX_NAME_LEN: usize = 100;

/// Running delivery counters of an endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    /// Number of HTTP attempts made.
    pub total_deliveries: u64,
    /// Number of attempts answered with a 2xx status.
    pub successful_deliveries: u64,
    /// Number of attempts that failed.
    pub failed_deliveries: u64,
    /// Failed attempts since the last success.
    pub consecutive_failures: u32,
}

/// A registered HTTP receiver subscribed to one or more event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Unique endpoint identifier.
    pub id: Uuid,
    /// Tenant the endpoint belongs to, if tenant-scoped.
    pub tenant_id: Option<String>,
    /// Human-readable name, sent in the envelope.
    pub name: String,
    /// Delivery target.
    pub url: Url,
    /// HMAC-SHA256 signing secret. Deliveries are unsigned when absent.
    pub secret: Option<String>,
    /// Event types this endpoint receives.
    pub events: BTreeSet<EventType>,
    /// Current operational status.
    pub status: EndpointStatus,
    /// Extra headers sent with every delivery.
    pub headers: HashMap<String, String>,
    /// Maximum number of HTTP attempts per delivery.
    pub max_retries: u32,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Whether TLS certificates of the target are verified.
    pub verify_tls: bool,
    /// Running delivery counters.
    pub stats: DeliveryStats,
    /// Last time an event was dispatched to this endpoint.
    pub last_triggered_at: Option<Timestamp>,
    /// Last successful attempt.
    pub last_success_at: Option<Timestamp>,
    /// Last failed attempt.
    pub last_failure_at: Option<Timestamp>,
    /// Error message of the last failed attempt.
    pub last_error_message: Option<String>,
    /// Timestamp when this endpoint was registered.
    pub created_at: Timestamp,
    /// Timestamp when this endpoint was last modified.
    pub updated_at: Timestamp,
}

impl Endpoint {
    /// Returns whether the endpoint is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns whether the endpoint subscribes to `event`.
    #[inline]
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.events.contains(event)
    }

    /// Returns whether the endpoint is visible to a caller scoped to `tenant_id`.
    ///
    /// Matching is exact: a tenant matches only its own endpoints and an
    /// unscoped caller matches only unscoped endpoints.
    #[inline]
    pub fn matches_tenant(&self, tenant_id: Option<&str>) -> bool {
        self.tenant_id.as_deref() == tenant_id
    }

    /// Returns the per-attempt timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the signing secret of a new endpoint comes from.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum SigningSecret {
    /// Generate a random secret.
    #[default]
    Generate,
    /// Use the supplied secret.
    Provided(String),
    /// Send deliveries unsigned.
    Disabled,
}

/// Data required to register a new endpoint.
#[must_use]
#[derive(Debug, Clone)]
pub struct NewEndpoint {
    /// Tenant the endpoint belongs to.
    pub tenant_id: Option<String>,
    /// Human-readable name.
    pub name: String,
    /// Delivery target; must be an absolute http(s) URL.
    pub url: String,
    /// Event types to subscribe to.
    pub events: Vec<String>,
    /// Signing secret source.
    pub secret: SigningSecret,
    /// Extra headers sent with every delivery.
    pub headers: HashMap<String, String>,
    /// Maximum number of HTTP attempts per delivery.
    pub max_retries: u32,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
    /// Initial status.
    pub status: EndpointStatus,
}

impl NewEndpoint {
    /// Creates a registration payload with default delivery settings.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tenant_id: None,
            name: name.into(),
            url: url.into(),
            events: Vec::new(),
            secret: SigningSecret::Generate,
            headers: HashMap::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
            status: EndpointStatus::Active,
        }
    }

    /// Scopes the endpoint to a tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Subscribes the endpoint to an event type.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.events.push(event.into());
        self
    }

    /// Subscribes the endpoint to several event types.
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events.extend(events.into_iter().map(Into::into));
        self
    }

    /// Uses the given signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = SigningSecret::Provided(secret.into());
        self
    }

    /// Sends deliveries without signature headers.
    pub fn unsigned(mut self) -> Self {
        self.secret = SigningSecret::Disabled;
        self
    }

    /// Adds a custom header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the maximum number of attempts per delivery.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-attempt timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets whether TLS certificates are verified.
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Sets the initial status.
    pub fn with_status(mut self, status: EndpointStatus) -> Self {
        self.status = status;
        self
    }

    /// Validates the payload and builds the endpoint record.
    pub fn into_endpoint(self) -> Result<Endpoint> {
        let url = parse_url(&self.url)?;
        let name = validate_name(self.name)?;
        let events = parse_events(self.events)?;
        validate_headers(&self.headers)?;
        validate_max_retries(self.max_retries)?;
        validate_timeout(self.timeout_secs)?;

        let secret = match self.secret {
            SigningSecret::Generate => Some(signer::generate_secret()),
            SigningSecret::Provided(secret) => Some(validate_secret(secret)?),
            SigningSecret::Disabled => None,
        };

        let now = Timestamp::now();
        Ok(Endpoint {
            id: Uuid::now_v7(),
            tenant_id: self.tenant_id,
            name,
            url,
            secret,
            events,
            status: self.status,
            headers: self.headers,
            max_retries: self.max_retries,
            timeout_secs: self.timeout_secs,
            verify_tls: self.verify_tls,
            stats: DeliveryStats::default(),
            last_triggered_at: None,
            last_success_at: None,
            last_failure_at: None,
            last_error_message: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Changes to apply to an existing endpoint. `None` fields are left untouched.
#[must_use]
#[derive(Debug, Default, Clone)]
pub struct UpdateEndpoint {
    /// New display name.
    pub name: Option<String>,
    /// New delivery target.
    pub url: Option<String>,
    /// Replacement set of subscribed event types.
    pub events: Option<Vec<String>>,
    /// Replacement custom headers.
    pub headers: Option<HashMap<String, String>>,
    /// New status. Setting `Active` resets the consecutive failure streak.
    pub status: Option<EndpointStatus>,
    /// New attempt ceiling.
    pub max_retries: Option<u32>,
    /// New per-attempt timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// New TLS verification flag.
    pub verify_tls: Option<bool>,
}

impl UpdateEndpoint {
    /// Checks the changes without applying them.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            parse_url(url)?;
        }
        if let Some(name) = &self.name {
            validate_name(name.clone())?;
        }
        if let Some(events) = &self.events {
            parse_events(events.clone())?;
        }
        if let Some(headers) = &self.headers {
            validate_headers(headers)?;
        }
        if let Some(max_retries) = self.max_retries {
            validate_max_retries(max_retries)?;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            validate_timeout(timeout_secs)?;
        }
        Ok(())
    }

    /// Validates the changes and applies them to `endpoint`.
    ///
    /// Nothing is modified when validation fails.
    pub fn apply(self, endpoint: &mut Endpoint) -> Result<()> {
        let url = self.url.as_deref().map(parse_url).transpose()?;
        let name = self.name.map(validate_name).transpose()?;
        let events = self.events.map(parse_events).transpose()?;
        if let Some(headers) = &self.headers {
            validate_headers(headers)?;
        }
        if let Some(max_retries) = self.max_retries {
            validate_max_retries(max_retries)?;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            validate_timeout(timeout_secs)?;
        }

        if let Some(url) = url {
            endpoint.url = url;
        }
        if let Some(name) = name {
            endpoint.name = name;
        }
        if let Some(events) = events {
            endpoint.events = events;
        }
        if let Some(headers) = self.headers {
            endpoint.headers = headers;
        }
        if let Some(max_retries) = self.max_retries {
            endpoint.max_retries = max_retries;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            endpoint.timeout_secs = timeout_secs;
        }
        if let Some(verify_tls) = self.verify_tls {
            endpoint.verify_tls = verify_tls;
        }
        if let Some(status) = self.status {
            if status.is_active() {
                endpoint.stats.consecutive_failures = 0;
            }
            endpoint.status = status;
        }

        endpoint.updated_at = Timestamp::now();
        Ok(())
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::configuration()
            .with_message(format!("unsupported URL scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::configuration().with_message("endpoint URL must have a host"));
    }

    Ok(url)
}

fn validate_name(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::invalid_input().with_message(format!(
            "endpoint name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

fn parse_events(events: Vec<String>) -> Result<BTreeSet<EventType>> {
    let events = events
        .into_iter()
        .map(EventType::new)
        .collect::<Result<BTreeSet<_>>>()?;

    if events.is_empty() {
        return Err(
            Error::invalid_input().with_message("endpoint must subscribe to at least one event")
        );
    }

    Ok(events)
}

fn validate_headers(custom: &HashMap<String, String>) -> Result<()> {
    for (name, value) in custom {
        if !headers::is_valid_name(name) || !headers::is_valid_value(value) {
            return Err(Error::configuration().with_message(format!("invalid header '{name}'")));
        }
        if headers::is_reserved(name) {
            return Err(Error::configuration()
                .with_message(format!("header '{name}' is reserved and cannot be overridden")));
        }
    }
    Ok(())
}

fn validate_max_retries(max_retries: u32) -> Result<()> {
    if max_retries > MAX_MAX_RETRIES {
        return Err(Error::configuration()
            .with_message(format!("max retries must be at most {MAX_MAX_RETRIES}")));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 || timeout_secs > MAX_TIMEOUT_SECS {
        return Err(Error::configuration().with_message(format!(
            "timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds"
        )));
    }
    Ok(())
}

fn validate_secret(secret: String) -> Result<String> {
    if secret.is_empty() {
        return Err(Error::configuration().with_message("signing secret cannot be empty"));
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn new_endpoint() -> NewEndpoint {
        NewEndpoint::new("Orders", "https://example.com/hooks").with_event("order.created")
    }

    #[test]
    fn registration_defaults() {
        let endpoint = new_endpoint().into_endpoint().unwrap();

        assert_eq!(endpoint.status, EndpointStatus::Active);
        assert_eq!(endpoint.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(endpoint.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(endpoint.verify_tls);
        assert!(endpoint.secret.as_deref().unwrap().starts_with("whsec_"));
        assert_eq!(endpoint.stats, DeliveryStats::default());
        assert!(endpoint.subscribes_to("order.created"));
    }

    #[test]
    fn unsigned_endpoint_has_no_secret() {
        let endpoint = new_endpoint().unsigned().into_endpoint().unwrap();
        assert!(endpoint.secret.is_none());
    }

    #[test]
    fn rejects_invalid_urls() {
        for url in ["not a url", "ftp://example.com/x", "/relative/path"] {
            let error = NewEndpoint::new("x", url)
                .with_event("order.created")
                .into_endpoint()
                .unwrap_err();
            assert_eq!(error.kind, ErrorKind::Configuration, "{url}");
        }
    }

    #[test]
    fn rejects_reserved_custom_headers() {
        let error = new_endpoint()
            .with_header("x-signature", "forged")
            .into_endpoint()
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);

        assert!(
            new_endpoint()
                .with_header("X-Api-Key", "k")
                .into_endpoint()
                .is_ok()
        );
    }

    #[test]
    fn custom_header_values_follow_http_rules() {
        let endpoint = new_endpoint()
            .with_header("X-Region", "café")
            .into_endpoint()
            .unwrap();
        assert_eq!(endpoint.headers["X-Region"], "café");

        for (name, value) in [("Bad Header", "v"), ("X-Split", "a\r\nb")] {
            let error = new_endpoint().with_header(name, value).into_endpoint().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn rejects_empty_subscription() {
        let error = NewEndpoint::new("x", "https://example.com")
            .into_endpoint()
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert!(new_endpoint().with_timeout_secs(0).into_endpoint().is_err());
        assert!(
            new_endpoint()
                .with_max_retries(MAX_MAX_RETRIES + 1)
                .into_endpoint()
                .is_err()
        );
    }

    #[test]
    fn tenant_matching_is_exact() {
        let scoped = new_endpoint().with_tenant("t1").into_endpoint().unwrap();
        let global = new_endpoint().into_endpoint().unwrap();

        assert!(scoped.matches_tenant(Some("t1")));
        assert!(!scoped.matches_tenant(Some("t2")));
        assert!(!scoped.matches_tenant(None));
        assert!(global.matches_tenant(None));
        assert!(!global.matches_tenant(Some("t1")));
    }

    #[test]
    fn reactivation_resets_failure_streak() {
        let mut endpoint = new_endpoint().into_endpoint().unwrap();
        endpoint.status = EndpointStatus::Suspended;
        endpoint.stats.consecutive_failures = 10;

        UpdateEndpoint {
            status: Some(EndpointStatus::Active),
            ..Default::default()
        }
        .apply(&mut endpoint)
        .unwrap();

        assert_eq!(endpoint.status, EndpointStatus::Active);
        assert_eq!(endpoint.stats.consecutive_failures, 0);
    }

    #[test]
    fn failed_update_leaves_endpoint_untouched() {
        let mut endpoint = new_endpoint().into_endpoint().unwrap();
        let before = endpoint.clone();

        let result = UpdateEndpoint {
            name: Some("Renamed".into()),
            url: Some("mailto:ops@example.com".into()),
            ..Default::default()
        }
        .apply(&mut endpoint);

        assert!(result.is_err());
        assert_eq!(endpoint, before);
    }
}
