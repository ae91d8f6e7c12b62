//! Tests for HTTP error mapping.

use super::*;
use crate::domain::{Error, ErrorCode};
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::{App, ResponseError, test as actix_test};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::new(ErrorCode::InsufficientStock, "short"), StatusCode::BAD_REQUEST)]
#[case(Error::new(ErrorCode::InvalidToken, "expired"), StatusCode::UNAUTHORIZED)]
#[case(Error::new(ErrorCode::NoOrganization, "none"), StatusCode::FORBIDDEN)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::new(ErrorCode::OrderNotFound, "missing"), StatusCode::NOT_FOUND)]
#[case(Error::new(ErrorCode::CourierBusy, "busy"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_follows_error_kind(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn render(error: Error) -> (StatusCode, Option<String>, ErrorEnvelope) {
    let response = ResponseError::error_response(&error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let envelope = serde_json::from_slice(&bytes).expect("error envelope");
    (status, header, envelope)
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(expected_trace_id: String) {
    let error = Error::internal("connection string leaked")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "secret": "x" }));

    let (status, header, envelope) = render(error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert!(!envelope.success);
    assert_eq!(envelope.code, ErrorCode::InternalError);
    assert_eq!(envelope.error, "Internal server error");
    assert!(envelope.details.is_none());
    assert_eq!(envelope.trace_id, Some(expected_trace_id));
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details(expected_trace_id: String) {
    let error = Error::new(ErrorCode::InsufficientStock, "insufficient stock")
        .with_trace_id(expected_trace_id)
        .with_details(json!({ "productId": "p-1" }));

    let (status, header, envelope) = render(error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(envelope.code, ErrorCode::InsufficientStock);
    assert_eq!(envelope.error, "insufficient stock");
    assert_eq!(envelope.details, Some(json!({ "productId": "p-1" })));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::invalid_request("bad").with_details(json!({ "field": "name" }));

    let (_, header, envelope) = render(error).await;

    assert!(header.is_none());
    assert!(envelope.trace_id.is_none());
}

#[rstest]
fn from_actix_error_is_redacted_internal_error() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[expect(dead_code, reason = "only deserialised to exercise the extractor")]
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct Query {
    #[expect(dead_code, reason = "only deserialised to exercise the extractor")]
    limit: u32,
}

#[rstest]
#[case::json_body("/json", Some("{\"quantity\": -1}"), "invalid_json")]
#[case::query_string("/query?limit=many", None, "invalid_query")]
#[actix_web::test]
async fn extractor_failures_use_the_error_envelope(
    #[case] uri: &str,
    #[case] body: Option<&str>,
    #[case] detail_code: &str,
) {
    let app = actix_test::init_service(
        App::new()
            .app_data(json_config())
            .app_data(query_config())
            .route(
                "/json",
                web::post().to(|_: web::Json<Payload>| async { HttpResponse::Ok().finish() }),
            )
            .route(
                "/query",
                web::get().to(|_: web::Query<Query>| async { HttpResponse::Ok().finish() }),
            ),
    )
    .await;

    let request = match body {
        Some(raw) => actix_test::TestRequest::post()
            .uri(uri)
            .insert_header(("content-type", "application/json"))
            .set_payload(raw.to_owned()),
        None => actix_test::TestRequest::get().uri(uri),
    }
    .to_request();

    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let envelope: ErrorEnvelope = actix_test::read_body_json(response).await;
    assert_eq!(envelope.code, ErrorCode::ValidationError);
    assert_eq!(envelope.details, Some(json!({ "code": detail_code })));
}
