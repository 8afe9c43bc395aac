use std::borrow::Cow;
use std::collections::HashMap;

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use super::Json;
use crate::handler::{Error, ErrorKind};

/// JSON extractor that runs `validator` checks after deserialization.
///
/// Validation failures become a `400 Bad Request` whose message lists every
/// offending field.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

fn number(params: &HashMap<Cow<'static, str>, serde_json::Value>, key: &str) -> Option<f64> {
    params.get(key).and_then(serde_json::Value::as_f64)
}

/// Describes a `length` or `range` failure from its bounds.
fn format_bounds(field: &str, error: &ValidationError, unit: &str) -> String {
    match (number(&error.params, "min"), number(&error.params, "max")) {
        (Some(min), Some(max)) => {
            format!("Field '{field}' must be between {min} and {max}{unit}")
        }
        (Some(min), None) => format!("Field '{field}' must be at least {min}{unit}"),
        (None, Some(max)) => format!("Field '{field}' must be at most {max}{unit}"),
        (None, None) => format!("Field '{field}' is out of range"),
    }
}

fn format_validation_error(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("Field '{field}': {message}");
    }

    match error.code.as_ref() {
        "length" => format_bounds(field, error, " items long"),
        "range" => format_bounds(field, error, ""),
        "url" => format!("Field '{field}' must be a valid URL (e.g., https://example.com)"),
        "required" => format!("Field '{field}' is required"),
        code => format!("Field '{field}' failed validation: {code}"),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors
                    .iter()
                    .map(move |error| format_validation_error(field, error))
            })
            .collect();
        messages.sort_unstable();

        let message = match messages.as_slice() {
            [] => "Validation failed".to_owned(),
            [single] => single.clone(),
            multiple => multiple.join(". "),
        };

        tracing::debug!(
            errors = ?errors.field_errors(),
            "Request validation failed"
        );

        ErrorKind::BadRequest
            .with_message(message)
            .with_resource("request")
    }
}
