//! Endpoint and delivery status enumerations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the operational status of a webhook endpoint.
///
/// Only [`EndpointStatus::Active`] endpoints receive new deliveries. An
/// endpoint is forced into [`EndpointStatus::Suspended`] after too many
/// consecutive delivery failures and stays there until explicitly reactivated.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EndpointStatus {
    /// Endpoint is active and will receive events
    #[default]
    Active,

    /// Endpoint was switched off by an operator
    Inactive,

    /// Endpoint was switched off after repeated delivery failures
    Suspended,
}

impl EndpointStatus {
    /// Returns whether the endpoint is active and receiving events.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, EndpointStatus::Active)
    }

    /// Returns whether the endpoint was suspended.
    #[inline]
    pub fn is_suspended(self) -> bool {
        matches!(self, EndpointStatus::Suspended)
    }
}

/// Defines the state of one delivery (an envelope sent to one endpoint).
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DeliveryStatus {
    /// Delivery was created and no attempt is in flight yet
    #[default]
    Pending,

    /// An HTTP attempt is in flight
    Sending,

    /// The endpoint acknowledged the delivery with a 2xx response
    Success,

    /// All permitted attempts failed
    Failed,

    /// The last attempt failed and another one is scheduled
    Retrying,
}

impl DeliveryStatus {
    /// Returns whether the delivery reached a state no automatic process leaves.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Success | DeliveryStatus::Failed)
    }

    /// Returns whether the delivery completed successfully.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, DeliveryStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_string(&EndpointStatus::Suspended).unwrap();
        assert_eq!(json, "\"SUSPENDED\"");

        let status: DeliveryStatus = serde_json::from_str("\"RETRYING\"").unwrap();
        assert_eq!(status, DeliveryStatus::Retrying);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            EndpointStatus::from_str("inactive").unwrap(),
            EndpointStatus::Inactive
        );
        assert_eq!(
            DeliveryStatus::from_str("failed").unwrap(),
            DeliveryStatus::Failed
        );
    }

    #[test]
    fn only_success_and_failed_are_terminal() {
        let terminal: Vec<_> = DeliveryStatus::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![DeliveryStatus::Success, DeliveryStatus::Failed]);
    }
}
