//! Delivery log query types.

use herald_webhook::types::{DeliveryFilter, DeliveryStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing delivery records.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListDeliveriesQuery {
    /// Only records of this endpoint.
    pub endpoint_id: Option<Uuid>,
    /// Only records in this status.
    pub status: Option<DeliveryStatus>,
    /// Only records of this tenant.
    pub tenant_id: Option<String>,
    /// Maximum number of records to return.
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

impl ListDeliveriesQuery {
    /// Converts these parameters into a delivery filter.
    pub fn into_filter(self) -> DeliveryFilter {
        DeliveryFilter {
            endpoint_id: self.endpoint_id,
            status: self.status,
            tenant_id: self.tenant_id,
            limit: self.limit,
        }
    }
}
