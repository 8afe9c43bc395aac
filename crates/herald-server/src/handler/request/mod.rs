//! Request types for HTTP handlers.

mod deliveries;
mod endpoints;
mod events;
mod maintenance;
mod paths;

pub use deliveries::*;
pub use endpoints::*;
pub use events::*;
pub use maintenance::*;
pub use paths::*;
