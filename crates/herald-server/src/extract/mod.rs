//! Request extractors with consistent error responses.
//!
//! Drop-in replacements for the axum extractors of the same name. Their
//! rejections are converted into [`handler::Error`] so that malformed
//! requests get the same JSON error body as every other failure.
//!
//! - [`Json`] - JSON body deserialization
//! - [`ValidateJson`] - JSON body deserialization followed by `validator` checks
//! - [`Path`] - path parameter extraction
//! - [`Query`] - query string extraction
//!
//! [`handler::Error`]: crate::handler::Error

mod enhanced_json;
mod enhanced_path;
mod enhanced_query;
mod validated_json;

pub use self::enhanced_json::Json;
pub use self::enhanced_path::Path;
pub use self::enhanced_query::Query;
pub use self::validated_json::ValidateJson;

/// Shortens rejection details before they are echoed back to the client.
fn sanitize_error_message(message: &str) -> String {
    let lines = message.lines().take(3).collect::<Vec<_>>();
    lines.join(" ").chars().take(200).collect()
}
