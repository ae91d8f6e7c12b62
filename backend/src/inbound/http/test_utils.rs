//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test::TestRequest, web};
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::domain::ports::{
    MockAccountService, MockCatalogService, MockClientService, MockCourierService,
    MockNotificationService, MockOrderService, MockOrganizationService,
};
use crate::domain::{
    DisplayName, Email, FirebaseUid, OrganizationId, Role, TenantContext, User, UserId,
};

use super::error::{json_config, path_config, query_config};
use super::state::HttpState;

/// Fixed organization used by handler tests.
pub const ORGANIZATION: &str = "7f1c5c8e-2b1a-4c4b-9d8e-0a1b2c3d4e5f";

/// Token accepted by [`TestPorts::authenticate_as`].
pub const TOKEN: &str = "token";

/// Mocked driving ports; unconfigured mocks panic when called.
#[derive(Default)]
pub struct TestPorts {
    pub accounts: MockAccountService,
    pub organizations: MockOrganizationService,
    pub catalog: MockCatalogService,
    pub clients: MockClientService,
    pub couriers: MockCourierService,
    pub orders: MockOrderService,
    pub notifications: MockNotificationService,
}

impl TestPorts {
    /// Resolve every bearer token to `user`.
    pub fn authenticate_as(&mut self, user: User) {
        self.accounts
            .expect_authenticate()
            .returning(move |_| Ok(user.clone()));
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            accounts: Arc::new(self.accounts),
            organizations: Arc::new(self.organizations),
            catalog: Arc::new(self.catalog),
            clients: Arc::new(self.clients),
            couriers: Arc::new(self.couriers),
            orders: Arc::new(self.orders),
            notifications: Arc::new(self.notifications),
        }
    }
}

fn user(role: Role, organization_id: Option<OrganizationId>) -> User {
    User {
        id: UserId::random(),
        firebase_uid: FirebaseUid::new("firebase-uid").expect("valid uid"),
        email: Email::new("ada@example.com").expect("valid email"),
        display_name: DisplayName::new("Ada").expect("valid name"),
        role,
        organization_id,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("timestamp"),
    }
}

pub fn organization_id() -> OrganizationId {
    OrganizationId::parse(ORGANIZATION).expect("valid organization id")
}

pub fn admin() -> User {
    user(Role::Admin, Some(organization_id()))
}

pub fn member() -> User {
    user(Role::Member, Some(organization_id()))
}

pub fn without_organization() -> User {
    user(Role::Member, None)
}

/// Tenant context matching [`member`] or [`admin`] for mock predicates.
pub fn same_organization(tenant: &TenantContext) -> bool {
    tenant.organization_id == organization_id()
}

/// Application exposing every API route under `/api/v1`.
pub fn test_app(
    ports: TestPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(ports.into_state()))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(web::scope("/api/v1").configure(super::configure))
}

/// Request carrying the test bearer token.
pub fn authed(request: TestRequest) -> TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {TOKEN}")))
}

/// Read the `code` field of an error envelope.
pub fn error_code(body: &Value) -> Option<&str> {
    body.get("code").and_then(Value::as_str)
}
