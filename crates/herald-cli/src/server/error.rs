//! Server error types with recovery suggestions.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Error type for server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Runtime server error.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Creates a bind error with address context.
    pub fn bind_error(address: impl ToString, source: io::Error) -> Self {
        Self::BindError {
            address: address.to_string(),
            source,
        }
    }

    /// Returns a unique error code for this error type.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BindError { .. } => "E001",
            Self::Runtime(_) => "E002",
        }
    }

    /// Returns whether retrying might succeed without a configuration change.
    pub fn is_recoverable(&self) -> bool {
        let source = match self {
            Self::BindError { source, .. } | Self::Runtime(source) => source,
        };

        matches!(
            source.kind(),
            io::ErrorKind::AddrInUse
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::Interrupted
                | io::ErrorKind::TimedOut
        )
    }

    /// Provides a human-readable suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::BindError { source, .. } => match source.kind() {
                io::ErrorKind::AddrInUse => {
                    Some("Another process is using this port; pick a different PORT")
                }
                io::ErrorKind::PermissionDenied => {
                    Some("Use a port above 1024 or run with the required privileges")
                }
                io::ErrorKind::AddrNotAvailable => {
                    Some("Check that HOST is an address of this machine")
                }
                _ => None,
            },
            Self::Runtime(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_in_use_is_recoverable() {
        let error = ServerError::bind_error(
            "127.0.0.1:3000",
            io::Error::from(io::ErrorKind::AddrInUse),
        );

        assert_eq!(error.error_code(), "E001");
        assert!(error.is_recoverable());
        assert!(error.suggestion().is_some());
        assert!(error.to_string().contains("127.0.0.1:3000"));
    }

    #[test]
    fn runtime_errors_have_no_suggestion() {
        let error = ServerError::Runtime(io::Error::other("boom"));
        assert_eq!(error.error_code(), "E002");
        assert!(!error.is_recoverable());
        assert!(error.suggestion().is_none());
    }
}
