//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler, the shared schemas and the
//! Firebase bearer security scheme. The document is served by Swagger UI in
//! debug builds and printed by `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Category, Client, Courier, Invitation, InvitationStatus, JoinRequest, JoinRequestStatus,
    Notification, NotificationKind, Order, OrderAssignment, OrderDetail, OrderStatus,
    Organization, OrganizationSettings, Product, Role, User,
};
use crate::inbound::http::accounts::RegisterRequest;
use crate::inbound::http::catalog::{
    CategoryRequest, ProductRemovalResponse, ProductRequest, StockAdjustmentRequest,
};
use crate::inbound::http::clients::ClientRequest;
use crate::inbound::http::couriers::CourierRequest;
use crate::inbound::http::envelope::{Deleted, ErrorEnvelope, PaginationMeta};
use crate::inbound::http::notifications::MarkedRead;
use crate::inbound::http::orders::{
    AssignmentRequest, OrderLineRequest, OrderRequest, StatusRequest,
};
use crate::inbound::http::organizations::{
    CreateOrganizationRequest, DecisionRequest, InvitationRequest, JoinRequestPayload,
    SettingsRequest,
};

/// Name of the bearer security scheme.
pub const BEARER_SCHEME: &str = "FirebaseBearer";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Firebase ID token issued to the signed-in user."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Delivery back-office API",
        description = "Multi-tenant management of orders, catalog, clients and couriers."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("FirebaseBearer" = [])),
    paths(
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::organizations::create_organization,
        crate::inbound::http::organizations::current_organization,
        crate::inbound::http::organizations::list_members,
        crate::inbound::http::organizations::invite_member,
        crate::inbound::http::organizations::my_invitations,
        crate::inbound::http::organizations::accept_invitation,
        crate::inbound::http::organizations::request_to_join,
        crate::inbound::http::organizations::pending_requests,
        crate::inbound::http::organizations::decide_request,
        crate::inbound::http::organizations::get_settings,
        crate::inbound::http::organizations::update_settings,
        crate::inbound::http::catalog::list_categories,
        crate::inbound::http::catalog::create_category,
        crate::inbound::http::catalog::get_category,
        crate::inbound::http::catalog::update_category,
        crate::inbound::http::catalog::delete_category,
        crate::inbound::http::catalog::list_products,
        crate::inbound::http::catalog::create_product,
        crate::inbound::http::catalog::get_product,
        crate::inbound::http::catalog::update_product,
        crate::inbound::http::catalog::delete_product,
        crate::inbound::http::catalog::adjust_stock,
        crate::inbound::http::clients::list_clients,
        crate::inbound::http::clients::create_client,
        crate::inbound::http::clients::get_client,
        crate::inbound::http::clients::update_client,
        crate::inbound::http::clients::delete_client,
        crate::inbound::http::couriers::list_couriers,
        crate::inbound::http::couriers::create_courier,
        crate::inbound::http::couriers::get_courier,
        crate::inbound::http::couriers::update_courier,
        crate::inbound::http::couriers::delete_courier,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::create_order,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::update_order,
        crate::inbound::http::orders::change_status,
        crate::inbound::http::orders::delete_order,
        crate::inbound::http::orders::assign_courier,
        crate::inbound::http::orders::unassign_courier,
        crate::inbound::http::orders::list_assignments,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
    ),
    components(schemas(
        User, Role, Organization, OrganizationSettings, Invitation, InvitationStatus,
        JoinRequest, JoinRequestStatus, Category, Product, Client, Courier, Order,
        OrderDetail, OrderAssignment, OrderStatus, Notification, NotificationKind,
        ErrorEnvelope, PaginationMeta, Deleted, RegisterRequest, CreateOrganizationRequest,
        InvitationRequest, JoinRequestPayload, DecisionRequest, SettingsRequest,
        CategoryRequest, ProductRequest, StockAdjustmentRequest, ProductRemovalResponse,
        ClientRequest, CourierRequest, OrderRequest, OrderLineRequest, StatusRequest,
        AssignmentRequest, MarkedRead
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "accounts", description = "Registration and the current user"),
        (name = "organizations", description = "Organizations, members, invitations and settings"),
        (name = "catalog", description = "Categories, products and stock"),
        (name = "clients", description = "Delivery clients"),
        (name = "couriers", description = "Couriers"),
        (name = "orders", description = "Orders and courier assignments"),
        (name = "notifications", description = "Organization notifications")
    )
)]
pub struct ApiDoc;
