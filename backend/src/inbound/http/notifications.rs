//! Organization notifications.
//!
//! ```text
//! GET   /api/v1/notifications?unread&cursor&limit
//! PATCH /api/v1/notifications/{id}/read
//! POST  /api/v1/notifications/read-all
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Notification, NotificationFilter, NotificationId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Tenant;
use crate::inbound::http::envelope::{Envelope, ErrorEnvelope, ok, paged};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Only unread notifications when `true`.
    pub unread: Option<bool>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// Number of notifications flipped to read.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkedRead {
    #[schema(example = 4)]
    pub updated: u64,
}

/// Newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Page of notifications", body = Envelope<Vec<Notification>>),
        (status = 400, description = "Invalid cursor", body = ErrorEnvelope)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    tenant: Tenant,
    query: web::Query<NotificationQuery>,
) -> ApiResult<HttpResponse> {
    let NotificationQuery {
        unread,
        cursor,
        limit,
    } = query.into_inner();
    let filter = NotificationFilter {
        unread_only: unread.unwrap_or(false),
    };
    let page = page_request(cursor.as_deref(), limit)?;
    let notifications = state
        .notifications
        .list(&tenant.context, filter, page)
        .await?;
    Ok(paged(notifications))
}

#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Envelope<Notification>),
        (status = 404, description = "Notification not found", body = ErrorEnvelope)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[patch("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: NotificationId = parse_id(&path, FieldName::new("id"))?;
    let notification = state.notifications.mark_read(&tenant.context, id).await?;
    Ok(ok(notification))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Unread notifications marked read", body = Envelope<MarkedRead>)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    tenant: Tenant,
) -> ApiResult<HttpResponse> {
    let updated = state.notifications.mark_all_read(&tenant.context).await?;
    Ok(ok(MarkedRead { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, ErrorCode, NotificationKind};
    use crate::inbound::http::test_utils::{
        TestPorts, authed, error_code, member, organization_id, same_organization, test_app,
        without_organization,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use pagination::Page;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn notification(read: bool) -> Notification {
        Notification {
            id: NotificationId::random(),
            organization_id: organization_id(),
            kind: NotificationKind::LowStock,
            title: "Low stock".into(),
            message: "Sparkling water has 2 units left".into(),
            order_id: None,
            product_id: None,
            read,
            created_at: Utc
                .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                .single()
                .expect("timestamp"),
        }
    }

    #[rstest]
    #[case("/api/v1/notifications?unread=true", true)]
    #[case("/api/v1/notifications", false)]
    #[actix_web::test]
    async fn list_applies_the_unread_filter(#[case] uri: &str, #[case] unread_only: bool) {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .notifications
            .expect_list()
            .withf(move |tenant, filter, _| {
                same_organization(tenant) && filter.unread_only == unread_only
            })
            .returning(|_, _, page| Ok(Page::from_overfetch(vec![notification(false)], page)));
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::get().uri(uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"][0]["kind"], json!("low_stock"));
        assert_eq!(body["data"][0]["read"], json!(false));
    }

    #[rstest]
    #[actix_web::test]
    async fn mark_read_returns_the_notification() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .notifications
            .expect_mark_read()
            .returning(|_, _| Ok(notification(true)));
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!("/api/v1/notifications/{}/read", NotificationId::random());
        let request = authed(actix_test::TestRequest::patch().uri(&uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"]["read"], json!(true));
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_notifications_are_not_found() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports.notifications.expect_mark_read().returning(|_, _| {
            Err(Error::new(ErrorCode::NotificationNotFound, "notification not found"))
        });
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!("/api/v1/notifications/{}/read", NotificationId::random());
        let request = authed(actix_test::TestRequest::patch().uri(&uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("NOTIFICATION_NOT_FOUND"));
    }

    #[rstest]
    #[actix_web::test]
    async fn read_all_reports_the_count() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .notifications
            .expect_mark_all_read()
            .times(1)
            .returning(|_| Ok(4));
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/notifications/read-all"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"]["updated"], json!(4));
    }

    #[rstest]
    #[actix_web::test]
    async fn users_without_an_organization_are_forbidden() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(without_organization());
        let app = actix_test::init_service(test_app(ports)).await;

        let request =
            authed(actix_test::TestRequest::get().uri("/api/v1/notifications")).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("NO_ORGANIZATION"));
    }
}
