//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request DTOs keep raw strings and JSON values so malformed input is
//! reported with the offending field instead of a generic body error.

use std::str::FromStr;

use pagination::{PageRequest, PaginationError};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::{Email, Error, ErrorCode as DomainErrorCode, Money, OrderStatus};

/// Detail codes attached to validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidAmount,
    InvalidEmail,
    InvalidStatus,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidStatus => "invalid_status",
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

    fn with_value(self, code: ErrorCode, value: impl Into<Value>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }

    fn with_index(self, code: ErrorCode, index: usize, value: impl Into<Value>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "index": index,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("missing required field: {name}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("{name} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

/// Parse a UUID-backed identifier.
pub(crate) fn parse_id<T: From<Uuid>>(value: &str, field: FieldName) -> Result<T, Error> {
    Uuid::parse_str(value.trim())
        .map(T::from)
        .map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_optional_id<T: From<Uuid>>(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<T>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_id(raw, field))
        .transpose()
}

/// Parse the identifier of a list element, reporting its index.
pub(crate) fn parse_indexed_id<T: From<Uuid>>(
    value: &str,
    field: FieldName,
    index: usize,
) -> Result<T, Error> {
    Uuid::parse_str(value.trim()).map(T::from).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name} must contain valid UUIDs")).with_index(
            ErrorCode::InvalidUuid,
            index,
            value,
        )
    })
}

/// Parse a monetary amount given as a JSON number or decimal string.
pub(crate) fn parse_amount(value: Value, field: FieldName) -> Result<Money, Error> {
    Money::deserialize(&value).map_err(|err| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name}: {err}"))
            .with_value(ErrorCode::InvalidAmount, value)
    })
}

pub(crate) fn parse_email(value: &str, field: FieldName) -> Result<Email, Error> {
    Email::new(value).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name} must be a valid email address"))
            .with_value(ErrorCode::InvalidEmail, value)
    })
}

pub(crate) fn parse_optional_email(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Email>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_email(raw, field))
        .transpose()
}

pub(crate) fn parse_order_status(value: &str, field: FieldName) -> Result<OrderStatus, Error> {
    OrderStatus::from_str(value.trim()).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(
            field,
            format!("{name} must be one of pending, in_process, en_route, delivered, cancelled"),
        )
        .with_value(ErrorCode::InvalidStatus, value)
    })
}

/// Build a page request from the `cursor` and `limit` query parameters.
pub(crate) fn page_request(cursor: Option<&str>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::from_query(cursor, limit).map_err(|err: PaginationError| {
        Error::new(DomainErrorCode::InvalidCursor, "cursor is invalid")
            .with_details(json!({ "field": "cursor", "reason": err.to_string() }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductId;
    use pagination::Cursor;
    use rstest::rstest;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a Value> {
        error.details().and_then(|details| details.get(key))
    }

    #[rstest]
    fn missing_fields_name_the_field() {
        let err = require::<String>(None, FieldName::new("clientId")).expect_err("missing");
        assert_eq!(err.code(), DomainErrorCode::ValidationError);
        assert_eq!(detail(&err, "field"), Some(&json!("clientId")));
        assert_eq!(detail(&err, "code"), Some(&json!("missing_field")));
    }

    #[rstest]
    fn ids_parse_into_typed_wrappers() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let id: ProductId = parse_id(raw, FieldName::new("id")).expect("valid id");
        assert_eq!(id.to_string(), raw);

        let err = parse_id::<ProductId>("nope", FieldName::new("id")).expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_uuid")));
        assert_eq!(detail(&err, "value"), Some(&json!("nope")));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("  "))]
    fn blank_optional_ids_are_absent(#[case] raw: Option<&str>) {
        let parsed: Option<ProductId> =
            parse_optional_id(raw, FieldName::new("categoryId")).expect("absent");
        assert!(parsed.is_none());
    }

    #[rstest]
    fn indexed_ids_report_their_position() {
        let err = parse_indexed_id::<ProductId>("x", FieldName::new("details.productId"), 2)
            .expect_err("invalid");
        assert_eq!(detail(&err, "index"), Some(&json!(2)));
    }

    #[rstest]
    #[case(json!(12.5), Some(1250))]
    #[case(json!("3.10"), Some(310))]
    #[case(json!(-1), None)]
    #[case(json!("abc"), None)]
    #[case(json!(true), None)]
    fn amounts_accept_numbers_and_strings(#[case] raw: Value, #[case] cents: Option<i64>) {
        let parsed = parse_amount(raw, FieldName::new("price"));
        match cents {
            Some(expected) => assert_eq!(parsed.expect("valid").cents(), expected),
            None => {
                let err = parsed.expect_err("invalid");
                assert_eq!(detail(&err, "code"), Some(&json!("invalid_amount")));
            }
        }
    }

    #[rstest]
    fn statuses_use_snake_case() {
        assert_eq!(
            parse_order_status("en_route", FieldName::new("status")).expect("valid"),
            OrderStatus::EnRoute
        );
        assert!(parse_order_status("shipped", FieldName::new("status")).is_err());
    }

    #[rstest]
    fn cursors_round_trip_and_reject_garbage() {
        let token = Cursor::new(40).encode();
        let page = page_request(Some(&token), Some(10)).expect("valid cursor");
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 10);

        let err = page_request(Some("***"), None).expect_err("invalid cursor");
        assert_eq!(err.code(), DomainErrorCode::InvalidCursor);
    }
}
