//! Organizations, membership invitations, join requests and settings.
//!
//! ```text
//! POST /api/v1/organizations
//! GET  /api/v1/organization
//! GET  /api/v1/organization/members
//! POST /api/v1/organization/invitations
//! GET  /api/v1/invitations
//! POST /api/v1/invitations/{id}/accept
//! POST /api/v1/organization-requests
//! GET  /api/v1/organization/requests
//! POST /api/v1/organization/requests/{id}/decision
//! GET  /api/v1/settings
//! PUT  /api/v1/settings
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    ADDRESS_MAX, CurrencyCode, DEFAULT_LOW_STOCK_THRESHOLD, Error, Invitation, InvitationId,
    JoinRequest, JoinRequestId, Organization, OrganizationId, OrganizationSettings, PHONE_MAX,
    SettingsUpdate, User, optional_text,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{CurrentUser, Tenant};
use crate::inbound::http::envelope::{Envelope, ErrorEnvelope, created, ok};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_email, parse_id, parse_optional_email, require,
};

/// Payload for creating an organization.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrganizationRequest {
    #[schema(example = "Acme Deliveries")]
    pub name: Option<String>,
}

/// Payload for inviting a user by email.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InvitationRequest {
    #[schema(example = "courier.lead@example.com")]
    pub email: Option<String>,
}

/// Payload for asking to join an organization.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestPayload {
    #[schema(format = Uuid)]
    pub organization_id: Option<String>,
    pub message: Option<String>,
}

/// Admin decision on a pending join request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub approve: Option<bool>,
}

/// Replacement organization settings. Omitted fields are cleared or reset
/// to their defaults.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "USD")]
    pub currency: Option<String>,
    #[schema(example = 5)]
    pub low_stock_threshold: Option<i64>,
}

const JOIN_MESSAGE_MAX: usize = 500;

fn parse_settings(payload: SettingsRequest) -> Result<SettingsUpdate, Error> {
    let currency = match payload.currency.as_deref().map(str::trim) {
        None | Some("") => CurrencyCode::default(),
        Some(raw) => CurrencyCode::new(raw)?,
    };
    let low_stock_threshold = match payload.low_stock_threshold {
        None => DEFAULT_LOW_STOCK_THRESHOLD,
        Some(raw) => u32::try_from(raw).map_err(|_| {
            Error::invalid_request("lowStockThreshold must be a non-negative integer")
                .with_details(serde_json::json!({
                    "field": "lowStockThreshold",
                    "code": "invalid_threshold",
                    "value": raw,
                }))
        })?,
    };
    Ok(SettingsUpdate {
        contact_email: parse_optional_email(
            payload.contact_email.as_deref(),
            FieldName::new("contactEmail"),
        )?,
        contact_phone: optional_text("contactPhone", payload.contact_phone.as_deref(), PHONE_MAX)?,
        address: optional_text("address", payload.address.as_deref(), ADDRESS_MAX)?,
        currency,
        low_stock_threshold,
    })
}

/// Create an organization and become its admin.
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = Envelope<Organization>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope),
        (status = 409, description = "Caller already has an organization", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "createOrganization"
)]
#[post("/organizations")]
pub async fn create_organization(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<CreateOrganizationRequest>,
) -> ApiResult<HttpResponse> {
    let name = require(payload.into_inner().name, FieldName::new("name"))?;
    let organization = state.organizations.create(&user.0, name).await?;
    Ok(created(organization))
}

/// The caller's organization.
#[utoipa::path(
    get,
    path = "/api/v1/organization",
    responses(
        (status = 200, description = "Organization", body = Envelope<Organization>),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope),
        (status = 403, description = "No organization", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "currentOrganization"
)]
#[get("/organization")]
pub async fn current_organization(
    state: web::Data<HttpState>,
    tenant: Tenant,
) -> ApiResult<HttpResponse> {
    let organization = state.organizations.current(&tenant.context).await?;
    Ok(ok(organization))
}

/// Members of the caller's organization.
#[utoipa::path(
    get,
    path = "/api/v1/organization/members",
    responses(
        (status = 200, description = "Members", body = Envelope<Vec<User>>),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope),
        (status = 403, description = "No organization", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "listMembers"
)]
#[get("/organization/members")]
pub async fn list_members(state: web::Data<HttpState>, tenant: Tenant) -> ApiResult<HttpResponse> {
    let members = state.organizations.members(&tenant.context).await?;
    Ok(ok(members))
}

/// Invite an email address to the organization (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/organization/invitations",
    request_body = InvitationRequest,
    responses(
        (status = 201, description = "Invitation created", body = Envelope<Invitation>),
        (status = 400, description = "Invalid email", body = ErrorEnvelope),
        (status = 403, description = "Not an admin", body = ErrorEnvelope),
        (status = 409, description = "Already invited or already a member", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "inviteMember"
)]
#[post("/organization/invitations")]
pub async fn invite_member(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<InvitationRequest>,
) -> ApiResult<HttpResponse> {
    let field = FieldName::new("email");
    let raw = require(payload.into_inner().email, field)?;
    let email = parse_email(&raw, field)?;
    let invitation = state.organizations.invite(&tenant.context, email).await?;
    Ok(created(invitation))
}

/// Pending invitations addressed to the caller's email.
#[utoipa::path(
    get,
    path = "/api/v1/invitations",
    responses(
        (status = 200, description = "Pending invitations", body = Envelope<Vec<Invitation>>),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "listMyInvitations"
)]
#[get("/invitations")]
pub async fn my_invitations(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<HttpResponse> {
    let invitations = state.organizations.invitations_for(&user.0).await?;
    Ok(ok(invitations))
}

/// Accept an invitation and join its organization as a member.
#[utoipa::path(
    post,
    path = "/api/v1/invitations/{id}/accept",
    params(("id" = String, Path, description = "Invitation id")),
    responses(
        (status = 200, description = "Joined organization", body = Envelope<Organization>),
        (status = 404, description = "Invitation not found", body = ErrorEnvelope),
        (status = 409, description = "Caller already has an organization", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "acceptInvitation"
)]
#[post("/invitations/{id}/accept")]
pub async fn accept_invitation(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: InvitationId = parse_id(&path, FieldName::new("id"))?;
    let organization = state.organizations.accept_invitation(&user.0, id).await?;
    Ok(ok(organization))
}

/// Ask to join an existing organization.
#[utoipa::path(
    post,
    path = "/api/v1/organization-requests",
    request_body = JoinRequestPayload,
    responses(
        (status = 201, description = "Request recorded", body = Envelope<JoinRequest>),
        (status = 404, description = "Organization not found", body = ErrorEnvelope),
        (status = 409, description = "Duplicate request or already a member", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "requestToJoin"
)]
#[post("/organization-requests")]
pub async fn request_to_join(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<JoinRequestPayload>,
) -> ApiResult<HttpResponse> {
    let JoinRequestPayload {
        organization_id,
        message,
    } = payload.into_inner();
    let field = FieldName::new("organizationId");
    let organization: OrganizationId = parse_id(&require(organization_id, field)?, field)?;
    let message = optional_text("message", message.as_deref(), JOIN_MESSAGE_MAX)?;
    let request = state
        .organizations
        .request_to_join(&user.0, organization, message)
        .await?;
    Ok(created(request))
}

/// Pending join requests for the caller's organization (admin only).
#[utoipa::path(
    get,
    path = "/api/v1/organization/requests",
    responses(
        (status = 200, description = "Pending requests", body = Envelope<Vec<JoinRequest>>),
        (status = 403, description = "Not an admin", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "listJoinRequests"
)]
#[get("/organization/requests")]
pub async fn pending_requests(
    state: web::Data<HttpState>,
    tenant: Tenant,
) -> ApiResult<HttpResponse> {
    let requests = state.organizations.pending_requests(&tenant.context).await?;
    Ok(ok(requests))
}

/// Approve or reject a join request (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/organization/requests/{id}/decision",
    params(("id" = String, Path, description = "Join request id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = Envelope<JoinRequest>),
        (status = 403, description = "Not an admin", body = ErrorEnvelope),
        (status = 404, description = "Request not found", body = ErrorEnvelope),
        (status = 409, description = "Request no longer pending", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "decideJoinRequest"
)]
#[post("/organization/requests/{id}/decision")]
pub async fn decide_request(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<DecisionRequest>,
) -> ApiResult<HttpResponse> {
    let id: JoinRequestId = parse_id(&path, FieldName::new("id"))?;
    let approve = require(payload.into_inner().approve, FieldName::new("approve"))?;
    let request = state
        .organizations
        .decide_request(&tenant.context, id, approve)
        .await?;
    Ok(ok(request))
}

/// Organization settings.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses(
        (status = 200, description = "Settings", body = Envelope<OrganizationSettings>),
        (status = 403, description = "No organization", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "getSettings"
)]
#[get("/settings")]
pub async fn get_settings(state: web::Data<HttpState>, tenant: Tenant) -> ApiResult<HttpResponse> {
    let settings = state.organizations.settings(&tenant.context).await?;
    Ok(ok(settings))
}

/// Replace organization settings (admin only).
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = Envelope<OrganizationSettings>),
        (status = 400, description = "Invalid settings", body = ErrorEnvelope),
        (status = 403, description = "Not an admin", body = ErrorEnvelope)
    ),
    tags = ["organizations"],
    operation_id = "updateSettings"
)]
#[put("/settings")]
pub async fn update_settings(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<SettingsRequest>,
) -> ApiResult<HttpResponse> {
    let update = parse_settings(payload.into_inner())?;
    let settings = state
        .organizations
        .update_settings(&tenant.context, update)
        .await?;
    Ok(ok(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, JoinRequestStatus};
    use crate::inbound::http::test_utils::{
        TestPorts, admin, authed, error_code, member, organization_id, same_organization,
        test_app, without_organization,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    fn settings_defaults_fill_missing_fields() {
        let update = parse_settings(SettingsRequest::default()).expect("valid");
        assert_eq!(update.currency, CurrencyCode::default());
        assert_eq!(update.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert!(update.contact_email.is_none());
    }

    #[rstest]
    #[case(SettingsRequest { low_stock_threshold: Some(-1), ..SettingsRequest::default() })]
    #[case(SettingsRequest { currency: Some("dollars".into()), ..SettingsRequest::default() })]
    #[case(SettingsRequest { contact_email: Some("nope".into()), ..SettingsRequest::default() })]
    fn settings_reject_invalid_values(#[case] payload: SettingsRequest) {
        let err = parse_settings(payload).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[rstest]
    #[actix_web::test]
    async fn create_organization_requires_a_name() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(without_organization());
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/organizations"))
            .set_json(json!({}))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], json!("name"));
    }

    #[rstest]
    #[actix_web::test]
    async fn create_organization_returns_201() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(without_organization());
        ports
            .organizations
            .expect_create()
            .withf(|user, name| user.organization_id.is_none() && name == "Acme")
            .returning(|_, name| {
                Ok(Organization {
                    id: organization_id(),
                    name,
                    created_at: Utc::now(),
                })
            });
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/organizations"))
            .set_json(json!({ "name": "Acme" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"]["name"], json!("Acme"));
    }

    #[rstest]
    #[actix_web::test]
    async fn organization_routes_need_membership() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(without_organization());
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::get().uri("/api/v1/organization"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("NO_ORGANIZATION"));
    }

    #[rstest]
    #[actix_web::test]
    async fn invitation_emails_are_validated_before_the_service() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(admin());
        let app = actix_test::init_service(test_app(ports)).await;

        let request =
            authed(actix_test::TestRequest::post().uri("/api/v1/organization/invitations"))
                .set_json(json!({ "email": "not-an-email" }))
                .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["code"], json!("invalid_email"));
    }

    #[rstest]
    #[actix_web::test]
    async fn members_cannot_decide_join_requests() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .organizations
            .expect_decide_request()
            .withf(|tenant, _, approve| same_organization(tenant) && *approve)
            .returning(|tenant, _, _| {
                tenant.require_admin()?;
                unreachable!("members are rejected")
            });
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!(
            "/api/v1/organization/requests/{}/decision",
            JoinRequestId::random()
        );
        let request = authed(actix_test::TestRequest::post().uri(&uri))
            .set_json(json!({ "approve": true }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("FORBIDDEN"));
    }

    #[rstest]
    #[actix_web::test]
    async fn join_requests_parse_the_organization_id() {
        let target = OrganizationId::random();
        let mut ports = TestPorts::default();
        let user = without_organization();
        let requester = user.id;
        ports.authenticate_as(user);
        ports
            .organizations
            .expect_request_to_join()
            .withf(move |_, organization, message| {
                *organization == target && message.as_deref() == Some("hello")
            })
            .returning(move |_, organization, message| {
                Ok(JoinRequest {
                    id: JoinRequestId::random(),
                    organization_id: organization,
                    user_id: requester,
                    message,
                    status: JoinRequestStatus::Pending,
                    created_at: Utc::now(),
                    decided_at: None,
                })
            });
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/organization-requests"))
            .set_json(json!({ "organizationId": target.to_string(), "message": " hello " }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"]["status"], json!("pending"));
    }
}
