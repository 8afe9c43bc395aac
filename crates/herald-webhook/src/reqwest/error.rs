//! Error types for reqwest-based webhook delivery.

use thiserror::Error;

/// Result type alias for reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    /// A header name or value cannot be sent.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The response status arrived but its body did not.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl From<Error> for crate::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Build(e) => crate::Error::internal_error()
                .with_message("Failed to build HTTP client")
                .with_source(e),
            Error::InvalidHeader(name) => {
                crate::Error::invalid_input().with_message(format!("Invalid header '{name}'"))
            }
            Error::Body(e) if e.is_timeout() => crate::Error::timeout()
                .with_message("Timed out reading response body")
                .with_source(e),
            Error::Body(e) => crate::Error::network_error()
                .with_message("Response body interrupted")
                .with_source(e),
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    crate::Error::timeout()
                        .with_message("Request timed out")
                        .with_source(e)
                } else if e.is_connect() {
                    crate::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else {
                    crate::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
        }
    }
}
