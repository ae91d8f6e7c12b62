//! Account registration and the current user.
//!
//! ```text
//! POST /api/v1/auth/register
//! GET  /api/v1/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::User;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{BearerToken, CurrentUser};
use crate::inbound::http::envelope::{Envelope, ErrorEnvelope, created, ok};
use crate::inbound::http::state::HttpState;

/// Registration payload. The identity itself comes from the bearer token.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Falls back to the token's name claim, then the email address.
    #[schema(example = "Ada Lovelace")]
    pub display_name: Option<String>,
}

/// Create the back-office user for the verified token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = Envelope<User>),
        (status = 400, description = "Token carries no email", body = ErrorEnvelope),
        (status = 401, description = "Invalid token", body = ErrorEnvelope),
        (status = 409, description = "Already registered", body = ErrorEnvelope)
    ),
    tags = ["accounts"],
    operation_id = "register"
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    token: BearerToken,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest { display_name } = payload.into_inner();
    let user = state.accounts.register(token.as_str(), display_name).await?;
    Ok(created(user))
}

/// The authenticated user with role and organization.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = Envelope<User>),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(user: CurrentUser) -> ApiResult<HttpResponse> {
    Ok(ok(user.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, ErrorCode};
    use crate::inbound::http::test_utils::{TOKEN, TestPorts, authed, error_code, member, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn register_passes_token_and_name() {
        let user = member();
        let mut ports = TestPorts::default();
        let returned = user.clone();
        ports
            .accounts
            .expect_register()
            .withf(|token, name| token == TOKEN && name.as_deref() == Some("Ada"))
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/auth/register"))
            .set_json(json!({ "displayName": "Ada" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["id"], json!(user.id.to_string()));
        assert_eq!(body["data"]["role"], json!("member"));
    }

    #[rstest]
    #[actix_web::test]
    async fn register_surfaces_duplicate_users() {
        let mut ports = TestPorts::default();
        ports.accounts.expect_register().returning(|_, _| {
            Err(Error::new(ErrorCode::UserAlreadyExists, "user already registered"))
        });
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/auth/register"))
            .set_json(json!({}))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("USER_ALREADY_EXISTS"));
        assert_eq!(body["success"], json!(false));
    }

    #[rstest]
    #[actix_web::test]
    async fn me_requires_a_bearer_token() {
        let app = actix_test::init_service(test_app(TestPorts::default())).await;

        let request = actix_test::TestRequest::get().uri("/api/v1/me").to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("UNAUTHORIZED"));
    }

    #[rstest]
    #[actix_web::test]
    async fn me_returns_the_resolved_user() {
        let user = member();
        let mut ports = TestPorts::default();
        ports.authenticate_as(user.clone());
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::get().uri("/api/v1/me")).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"]["email"], json!("ada@example.com"));
    }

    #[rstest]
    #[actix_web::test]
    async fn unregistered_users_are_rejected() {
        let mut ports = TestPorts::default();
        ports.accounts.expect_authenticate().returning(|_| {
            Err(Error::new(ErrorCode::UserNotRegistered, "user is not registered"))
        });
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::get().uri("/api/v1/me")).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("USER_NOT_REGISTERED"));
    }
}
