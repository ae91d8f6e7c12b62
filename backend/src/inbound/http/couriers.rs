//! Couriers.
//!
//! ```text
//! GET    /api/v1/couriers?active&cursor&limit
//! POST   /api/v1/couriers
//! GET    /api/v1/couriers/{id}
//! PUT    /api/v1/couriers/{id}
//! DELETE /api/v1/couriers/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Courier, CourierDraft, CourierId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Tenant;
use crate::inbound::http::envelope::{Deleted, Envelope, ErrorEnvelope, created, ok, paged};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id, require};

/// Courier fields. `active` defaults to true.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CourierRequest {
    #[schema(example = "Linus")]
    pub name: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "cargo bike")]
    pub vehicle: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourierQuery {
    /// Only active (`true`) or inactive (`false`) couriers.
    pub active: Option<bool>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

fn parse_courier(payload: CourierRequest) -> Result<CourierDraft, Error> {
    let name = require(payload.name, FieldName::new("name"))?;
    CourierDraft::new(
        &name,
        payload.phone.as_deref(),
        payload.vehicle.as_deref(),
        payload.active.unwrap_or(true),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/couriers",
    params(CourierQuery),
    responses(
        (status = 200, description = "Page of couriers", body = Envelope<Vec<Courier>>),
        (status = 400, description = "Invalid cursor", body = ErrorEnvelope)
    ),
    tags = ["couriers"],
    operation_id = "listCouriers"
)]
#[get("/couriers")]
pub async fn list_couriers(
    state: web::Data<HttpState>,
    tenant: Tenant,
    query: web::Query<CourierQuery>,
) -> ApiResult<HttpResponse> {
    let CourierQuery {
        active,
        cursor,
        limit,
    } = query.into_inner();
    let page = page_request(cursor.as_deref(), limit)?;
    let couriers = state.couriers.list(&tenant.context, active, page).await?;
    Ok(paged(couriers))
}

#[utoipa::path(
    post,
    path = "/api/v1/couriers",
    request_body = CourierRequest,
    responses(
        (status = 201, description = "Courier created", body = Envelope<Courier>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope)
    ),
    tags = ["couriers"],
    operation_id = "createCourier"
)]
#[post("/couriers")]
pub async fn create_courier(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<CourierRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_courier(payload.into_inner())?;
    let courier = state.couriers.create(&tenant.context, draft).await?;
    Ok(created(courier))
}

#[utoipa::path(
    get,
    path = "/api/v1/couriers/{id}",
    params(("id" = String, Path, description = "Courier id")),
    responses(
        (status = 200, description = "Courier", body = Envelope<Courier>),
        (status = 404, description = "Courier not found", body = ErrorEnvelope)
    ),
    tags = ["couriers"],
    operation_id = "getCourier"
)]
#[get("/couriers/{id}")]
pub async fn get_courier(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: CourierId = parse_id(&path, FieldName::new("id"))?;
    let courier = state.couriers.get(&tenant.context, id).await?;
    Ok(ok(courier))
}

#[utoipa::path(
    put,
    path = "/api/v1/couriers/{id}",
    params(("id" = String, Path, description = "Courier id")),
    request_body = CourierRequest,
    responses(
        (status = 200, description = "Courier updated", body = Envelope<Courier>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 404, description = "Courier not found", body = ErrorEnvelope)
    ),
    tags = ["couriers"],
    operation_id = "updateCourier"
)]
#[put("/couriers/{id}")]
pub async fn update_courier(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<CourierRequest>,
) -> ApiResult<HttpResponse> {
    let id: CourierId = parse_id(&path, FieldName::new("id"))?;
    let draft = parse_courier(payload.into_inner())?;
    let courier = state.couriers.update(&tenant.context, id, draft).await?;
    Ok(ok(courier))
}

/// Delete a courier with no open assignment.
#[utoipa::path(
    delete,
    path = "/api/v1/couriers/{id}",
    params(("id" = String, Path, description = "Courier id")),
    responses(
        (status = 200, description = "Courier deleted", body = Envelope<Deleted>),
        (status = 404, description = "Courier not found", body = ErrorEnvelope),
        (status = 409, description = "Courier has open deliveries", body = ErrorEnvelope)
    ),
    tags = ["couriers"],
    operation_id = "deleteCourier"
)]
#[delete("/couriers/{id}")]
pub async fn delete_courier(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: CourierId = parse_id(&path, FieldName::new("id"))?;
    state.couriers.delete(&tenant.context, id).await?;
    Ok(ok(Deleted { id: *id.as_uuid() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{
        TestPorts, authed, error_code, member, organization_id, test_app,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use pagination::Page;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn courier(active: bool) -> Courier {
        Courier {
            id: CourierId::random(),
            organization_id: organization_id(),
            name: "Linus".into(),
            phone: None,
            vehicle: Some("van".into()),
            active,
        }
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(false), false)]
    fn active_defaults_to_true(#[case] active: Option<bool>, #[case] expected: bool) {
        let draft = parse_courier(CourierRequest {
            name: Some("Linus".into()),
            active,
            ..CourierRequest::default()
        })
        .expect("valid");
        assert_eq!(draft.active, expected);
    }

    #[rstest]
    #[case("/api/v1/couriers?active=true", Some(true))]
    #[case("/api/v1/couriers?active=false", Some(false))]
    #[case("/api/v1/couriers", None)]
    #[actix_web::test]
    async fn list_forwards_the_active_filter(#[case] uri: &str, #[case] expected: Option<bool>) {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .couriers
            .expect_list()
            .withf(move |_, active, _| *active == expected)
            .returning(|_, active, page| {
                Ok(Page::from_overfetch(
                    vec![courier(active.unwrap_or(true))],
                    page,
                ))
            });
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::get().uri(uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"][0]["vehicle"], json!("van"));
    }

    #[rstest]
    #[actix_web::test]
    async fn busy_couriers_cannot_be_deleted() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .couriers
            .expect_delete()
            .returning(|_, _| Err(Error::new(ErrorCode::CourierBusy, "courier is busy")));
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!("/api/v1/couriers/{}", CourierId::random());
        let request = authed(actix_test::TestRequest::delete().uri(&uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("COURIER_BUSY"));
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_names_are_reported() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/couriers"))
            .set_json(json!({ "vehicle": "van" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], json!("name"));
        assert_eq!(body["details"]["code"], json!("missing_field"));
    }
}
