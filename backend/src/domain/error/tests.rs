//! Tests for domain error construction, categorisation and serde contracts.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
fn invalid_request_constructor_uses_validation_code(base_error: Error) {
    assert_eq!(base_error.code(), ErrorCode::ValidationError);
    assert_eq!(base_error.kind(), ErrorKind::InvalidRequest);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::ValidationError, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_no_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("fixture is a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::not_found("missing") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
#[case(ErrorCode::Unauthorized, ErrorKind::Unauthorized)]
#[case(ErrorCode::UserNotRegistered, ErrorKind::Unauthorized)]
#[case(ErrorCode::NoOrganization, ErrorKind::Forbidden)]
#[case(ErrorCode::MissingFields, ErrorKind::InvalidRequest)]
#[case(ErrorCode::InsufficientStock, ErrorKind::InvalidRequest)]
#[case(ErrorCode::TotalMismatch, ErrorKind::InvalidRequest)]
#[case(ErrorCode::InvalidStatusTransition, ErrorKind::InvalidRequest)]
#[case(ErrorCode::ClientNotFound, ErrorKind::NotFound)]
#[case(ErrorCode::CategoryInUse, ErrorKind::Conflict)]
#[case(ErrorCode::OrderNotEditable, ErrorKind::Conflict)]
#[case(ErrorCode::ServiceUnavailable, ErrorKind::ServiceUnavailable)]
#[case(ErrorCode::InternalError, ErrorKind::Internal)]
fn codes_map_to_expected_kinds(#[case] code: ErrorCode, #[case] kind: ErrorKind) {
    assert_eq!(code.kind(), kind);
}

#[rstest]
fn codes_serialise_screaming_snake_case() {
    let value = serde_json::to_value(ErrorCode::InsufficientStock).expect("serialise code");
    assert_eq!(value, json!("INSUFFICIENT_STOCK"));
    let value = serde_json::to_value(ErrorCode::NoOrganization).expect("serialise code");
    assert_eq!(value, json!("NO_ORGANIZATION"));
}

#[rstest]
fn serde_round_trip_preserves_payload() {
    let error = Error::new(ErrorCode::TotalMismatch, "total mismatch")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "submitted": 10.0, "computed": 12.5 }));
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(value.get("traceId").and_then(|v| v.as_str()), Some(TRACE_ID));

    let decoded: Error = serde_json::from_value(value).expect("deserialise error");
    assert_eq!(decoded, error);
}

#[rstest]
#[tokio::test]
async fn deserialising_ignores_ambient_trace() {
    let trace_id: TraceId = TRACE_ID.parse().expect("fixture is a valid UUID");
    let payload = json!({ "code": "NOT_FOUND", "message": "missing" });
    let error = TraceId::scope(trace_id, async move {
        serde_json::from_value::<Error>(payload).expect("valid payload")
    })
    .await;
    assert!(error.trace_id().is_none());
}

#[rstest]
fn deserialising_rejects_blank_message() {
    let payload = json!({ "code": "NOT_FOUND", "message": "  " });
    assert!(serde_json::from_value::<Error>(payload).is_err());
}
