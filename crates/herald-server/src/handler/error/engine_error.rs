//! Delivery engine error to HTTP error conversion.

use herald_webhook::ErrorKind as EngineErrorKind;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for engine error conversions.
const TRACING_TARGET: &str = "herald_server::handler::engine";

impl From<herald_webhook::Error> for HttpError<'static> {
    fn from(error: herald_webhook::Error) -> Self {
        let message = error
            .message
            .as_deref()
            .unwrap_or("Webhook operation failed")
            .to_owned();

        match error.kind {
            EngineErrorKind::InvalidInput | EngineErrorKind::Configuration => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Rejected invalid webhook request"
                );

                ErrorKind::BadRequest.with_message(message)
            }
            EngineErrorKind::NotFound => ErrorKind::NotFound.with_message(message),
            EngineErrorKind::Conflict => ErrorKind::Conflict.with_message(message),
            EngineErrorKind::Unavailable => ErrorKind::ServiceUnavailable.with_message(message),
            EngineErrorKind::Serialization => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Webhook payload serialization failed"
                );

                ErrorKind::InternalServerError
                    .with_message("Failed to serialize webhook payload")
                    .with_context(message)
            }
            _ => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind,
                    "Webhook engine operation failed"
                );

                ErrorKind::InternalServerError
                    .with_message("Webhook operation failed")
                    .with_context(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_status_codes() {
        let cases = [
            (herald_webhook::Error::invalid_input(), ErrorKind::BadRequest),
            (herald_webhook::Error::configuration(), ErrorKind::BadRequest),
            (herald_webhook::Error::not_found(), ErrorKind::NotFound),
            (herald_webhook::Error::conflict(), ErrorKind::Conflict),
            (herald_webhook::Error::unavailable(), ErrorKind::ServiceUnavailable),
            (herald_webhook::Error::timeout(), ErrorKind::InternalServerError),
            (herald_webhook::Error::internal_error(), ErrorKind::InternalServerError),
        ];

        for (error, expected) in cases {
            assert_eq!(HttpError::from(error).kind(), expected);
        }
    }

    #[test]
    fn message_is_carried_over() {
        let error = herald_webhook::Error::conflict().with_message("delivery already succeeded");
        let error = HttpError::from(error);
        assert_eq!(error.message(), Some("delivery already succeeded"));
    }
}
