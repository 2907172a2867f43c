//! Field-level validation failures shared by domain constructors.
//!
//! Domain types reject bad input with a [`FieldError`]; the conversion into
//! [`Error`] produces an `invalid_request` payload whose `details` name the
//! offending field and a stable code clients can branch on.

use serde_json::json;

use super::Error;

/// Stable validation failure codes reported in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorCode {
    Required,
    TooLong,
    OutOfRange,
    InvalidFormat,
    InvalidValue,
}

impl FieldErrorCode {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooLong => "too_long",
            Self::OutOfRange => "out_of_range",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// A rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    field: &'static str,
    code: FieldErrorCode,
    message: String,
    value: Option<String>,
}

impl FieldError {
    pub fn new(field: &'static str, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
            value: None,
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, FieldErrorCode::Required, format!("{field} is required"))
    }

    pub fn too_long(field: &'static str, max: usize) -> Self {
        Self::new(
            field,
            FieldErrorCode::TooLong,
            format!("{field} must be at most {max} characters"),
        )
    }

    pub fn out_of_range(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorCode::OutOfRange, message)
    }

    pub fn invalid_format(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorCode::InvalidFormat, message)
    }

    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorCode::InvalidValue, message)
    }

    /// Echo the rejected value back to the client.
    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn code(&self) -> FieldErrorCode {
        self.code
    }
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Self {
        let details = match &err.value {
            Some(value) => json!({
                "field": err.field,
                "code": err.code.as_str(),
                "value": value,
            }),
            None => json!({ "field": err.field, "code": err.code.as_str() }),
        };
        Error::invalid_request(err.message).with_details(details)
    }
}

/// Trim `value` and require it to be non-empty and at most `max` characters.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::required(field));
    }
    if trimmed.chars().count() > max {
        return Err(FieldError::too_long(field, max));
    }
    Ok(trimmed.to_owned())
}

/// Like [`required_text`] but maps blank input to `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, FieldError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => required_text(field, text, max).map(Some),
    }
}
