//! Data model shared by the engine, the registry and the HTTP surface.

mod delivery;
mod endpoint;
mod event;
mod status;

pub use delivery::{DEFAULT_LIST_LIMIT, DeliveryFilter, DeliveryRecord, MAX_LIST_LIMIT, ResponseInfo};
pub use endpoint::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, DeliveryStats, Endpoint, MAX_MAX_RETRIES,
    MAX_NAME_LEN, MAX_TIMEOUT_SECS, NewEndpoint, SigningSecret, UpdateEndpoint,
};
pub use event::{EventId, EventType, MAX_EVENT_TYPE_LEN};
pub use status::{DeliveryStatus, EndpointStatus};
