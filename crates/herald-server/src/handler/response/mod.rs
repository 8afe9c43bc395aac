//! Response types for HTTP handlers.

mod deliveries;
mod endpoints;
mod errors;
mod events;
mod maintenance;
mod monitors;

pub use deliveries::*;
pub use endpoints::*;
pub use errors::*;
pub use events::*;
pub use maintenance::*;
pub use monitors::*;
