//! Background workers.

mod retention;

pub use retention::RetentionWorker;
