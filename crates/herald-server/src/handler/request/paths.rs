//! Path parameter types for HTTP handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameters for endpoint operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPathParams {
    /// Unique identifier of the endpoint.
    pub endpoint_id: Uuid,
}

/// Path parameters for delivery record operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPathParams {
    /// Unique identifier of the delivery record.
    pub delivery_id: Uuid,
}
