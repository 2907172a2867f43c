//! Shared validation helpers for inbound HTTP adapters.

use chrono::NaiveDate;
use pagination::{PageError, PageQuery, PageRequest};
use serde_json::json;

use crate::domain::{Error, Language, OrderStatus};

/// Validation error codes for query string failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    OutOfRange,
    InvalidDate,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

/// Validate `page`/`limit` query parameters.
pub(crate) fn page_request(query: PageQuery) -> Result<PageRequest, Error> {
    query.validate().map_err(|err| {
        let field = match err {
            PageError::PageOutOfRange => FieldName::new("page"),
            PageError::LimitOutOfRange { .. } => FieldName::new("limit"),
        };
        ValidationError::new(field, err.to_string()).with_code(ErrorCode::OutOfRange)
    })
}

/// Parse a `YYYY-MM-DD` calendar day.
pub(crate) fn parse_date(field: FieldName, value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name} must be a date formatted YYYY-MM-DD"))
            .with_value(ErrorCode::InvalidDate, value)
    })
}

pub(crate) fn parse_order_status(value: &str) -> Result<OrderStatus, Error> {
    value.parse::<OrderStatus>().map_err(|_| {
        ValidationError::new(
            FieldName::new("status"),
            "status must be one of: new, processing, ready, delivered, cancelled",
        )
        .with_value(ErrorCode::InvalidValue, value)
    })
}

/// Response language; Russian when absent.
pub(crate) fn parse_language(value: Option<&str>) -> Result<Language, Error> {
    match value {
        None => Ok(Language::Ru),
        Some(code) => Language::parse(code).ok_or_else(|| {
            ValidationError::new(FieldName::new("lang"), "lang must be one of: ru, uz")
                .with_value(ErrorCode::InvalidValue, code)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0), None, "page")]
    #[case(None, Some(101), "limit")]
    fn page_errors_name_the_field(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] field: &str,
    ) {
        let err = page_request(PageQuery { page, limit }).expect_err("out of range");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(
            err.details(),
            Some(&json!({ "field": field, "code": "out_of_range" }))
        );
    }

    #[rstest]
    fn parses_iso_dates() {
        let day = parse_date(FieldName::new("date"), "2024-02-29").expect("leap day");
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 2, 29).expect("date"));
    }

    #[rstest]
    #[case("2023-02-29")]
    #[case("29.02.2024")]
    #[case("")]
    fn rejects_malformed_dates(#[case] value: &str) {
        let err = parse_date(FieldName::new("from"), value).expect_err("bad date");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "from");
        assert_eq!(details["code"], "invalid_date");
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        let err = parse_order_status("shipped").expect_err("unknown status");
        assert_eq!(err.details().expect("details")["value"], "shipped");
    }

    #[rstest]
    #[case(None, Language::Ru)]
    #[case(Some("uz"), Language::Uz)]
    fn language_defaults_to_russian(#[case] value: Option<&str>, #[case] expected: Language) {
        assert_eq!(parse_language(value).expect("language"), expected);
    }
}
