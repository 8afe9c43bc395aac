//! Event type names and event identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Maximum length of an event type name.
pub const MAX_EVENT_TYPE_LEN: usize = 128;

/// Name of a domain event, such as `order.created` or `stock.low`.
///
/// Event types are free-form so that any domain module can publish without
/// a central registry, but they are restricted to ASCII letters, digits and
/// the separators `.`, `_`, `:` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventType(String);

impl EventType {
    /// Event type used by test deliveries.
    pub const TEST: &'static str = "webhook.test";

    /// Parses and validates an event type name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() || name.len() > MAX_EVENT_TYPE_LEN {
            return Err(Error::invalid_input().with_message(format!(
                "event type must be between 1 and {MAX_EVENT_TYPE_LEN} characters"
            )));
        }

        let valid = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'));
        if !valid {
            return Err(Error::invalid_input()
                .with_message(format!("event type '{name}' contains invalid characters")));
        }

        Ok(Self(name))
    }

    /// Returns the event type used by test deliveries.
    pub fn test() -> Self {
        Self(Self::TEST.to_owned())
    }

    /// Returns the event type name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EventType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.0
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Correlation identifier of one delivery, shared by all of its attempts.
///
/// Formatted as `evt_<unix millis>_<random>` so receivers can deduplicate
/// at-least-once deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generates a fresh event identifier.
    pub fn generate() -> Self {
        let millis = Timestamp::now().as_millisecond();
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("evt_{millis}_{}", &random[..12]))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
