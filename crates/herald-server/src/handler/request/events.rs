//! Event publishing request types.

use herald_webhook::TriggerEvent;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for publishing an event to subscribed endpoints.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEventRequest {
    /// Event type name, e.g. `order.created`.
    #[validate(length(min = 1, max = 128))]
    pub event: String,
    /// Arbitrary event data placed into the envelope.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Restricts delivery to endpoints of this tenant.
    pub tenant_id: Option<String>,
    /// Domain entity the event refers to.
    pub entity_id: Option<String>,
}

impl TriggerEventRequest {
    /// Converts this request into an engine trigger.
    pub fn into_trigger(self) -> TriggerEvent {
        TriggerEvent {
            event: self.event,
            data: self.data,
            tenant_id: self.tenant_id,
            entity_id: self.entity_id,
        }
    }
}
