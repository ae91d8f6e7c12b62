//! Orders, status changes and courier assignments.
//!
//! ```text
//! GET    /api/v1/orders?status&clientId&cursor&limit
//! POST   /api/v1/orders
//! GET    /api/v1/orders/{id}
//! PUT    /api/v1/orders/{id}
//! PATCH  /api/v1/orders/{id}/status
//! DELETE /api/v1/orders/{id}
//! PUT    /api/v1/orders/{id}/assignment
//! DELETE /api/v1/orders/{id}/assignment
//! GET    /api/v1/assignments?courierId
//! ```
//!
//! Payload shape problems are reported here; composition rules (missing
//! fields, quantities, stock, totals) are enforced by the order service.

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CourierId, Error, Order, OrderAssignment, OrderDraft, OrderFilter, OrderId, OrderLineDraft,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Tenant;
use crate::inbound::http::envelope::{Deleted, Envelope, ErrorEnvelope, created, ok, paged};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, page_request, parse_amount, parse_id, parse_indexed_id, parse_optional_id,
    parse_order_status, require,
};

/// One requested product line.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[schema(format = Uuid)]
    pub product_id: Option<String>,
    #[schema(example = 2)]
    pub quantity: Option<i64>,
}

/// Order submission. Missing fields are reported together.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[schema(format = Uuid)]
    pub client_id: Option<String>,
    #[schema(example = "221B Baker Street")]
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub details: Vec<OrderLineRequest>,
    /// Expected total; must be within one cent of the computed total.
    #[schema(value_type = Option<f64>, example = 37.5)]
    pub total: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusRequest {
    #[schema(example = "in_process")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    #[schema(format = Uuid)]
    pub courier_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    /// One of pending, in_process, en_route, delivered, cancelled.
    pub status: Option<String>,
    pub client_id: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentQuery {
    pub courier_id: Option<String>,
}

fn parse_order(payload: OrderRequest) -> Result<OrderDraft, Error> {
    let OrderRequest {
        client_id,
        delivery_address,
        notes,
        details,
        total,
    } = payload;
    let details = details
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let product_id = line
                .product_id
                .as_deref()
                .map(|raw| parse_indexed_id(raw, FieldName::new("productId"), index))
                .transpose()?;
            Ok(OrderLineDraft {
                product_id,
                quantity: line.quantity,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let total_field = FieldName::new("total");
    Ok(OrderDraft {
        client_id: parse_optional_id(client_id.as_deref(), FieldName::new("clientId"))?,
        delivery_address,
        notes,
        details,
        total: total
            .filter(|value| !value.is_null())
            .map(|value| parse_amount(value, total_field))
            .transpose()?,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderQuery),
    responses(
        (status = 200, description = "Page of orders, newest first", body = Envelope<Vec<Order>>),
        (status = 400, description = "Invalid filter or cursor", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    tenant: Tenant,
    query: web::Query<OrderQuery>,
) -> ApiResult<HttpResponse> {
    let OrderQuery {
        status,
        client_id,
        cursor,
        limit,
    } = query.into_inner();
    let filter = OrderFilter {
        status: status
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_order_status(raw, FieldName::new("status")))
            .transpose()?,
        client_id: parse_optional_id(client_id.as_deref(), FieldName::new("clientId"))?,
    };
    let page = page_request(cursor.as_deref(), limit)?;
    let orders = state.orders.list(&tenant.context, filter, page).await?;
    Ok(paged(orders))
}

/// Compose and store an order, reserving stock.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order created", body = Envelope<Order>),
        (status = 400, description = "Missing fields, bad quantity, insufficient stock or total mismatch", body = ErrorEnvelope),
        (status = 404, description = "Client or product not found", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<OrderRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_order(payload.into_inner())?;
    let order = state.orders.create(&tenant.context, draft).await?;
    Ok(created(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with details and assignment", body = Envelope<Order>),
        (status = 404, description = "Order not found", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/orders/{id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, FieldName::new("id"))?;
    let order = state.orders.get(&tenant.context, id).await?;
    Ok(ok(order))
}

/// Recompose a pending order.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Order updated", body = Envelope<Order>),
        (status = 400, description = "Invalid order", body = ErrorEnvelope),
        (status = 404, description = "Order, client or product not found", body = ErrorEnvelope),
        (status = 409, description = "Order is no longer pending", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "updateOrder"
)]
#[put("/orders/{id}")]
pub async fn update_order(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<OrderRequest>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, FieldName::new("id"))?;
    let draft = parse_order(payload.into_inner())?;
    let order = state.orders.update(&tenant.context, id, draft).await?;
    Ok(ok(order))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    params(("id" = String, Path, description = "Order id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status changed", body = Envelope<Order>),
        (status = 400, description = "Invalid transition or no courier", body = ErrorEnvelope),
        (status = 404, description = "Order not found", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "changeOrderStatus"
)]
#[patch("/orders/{id}/status")]
pub async fn change_status(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, FieldName::new("id"))?;
    let field = FieldName::new("status");
    let raw = require(payload.into_inner().status, field)?;
    let status = parse_order_status(&raw, field)?;
    let order = state
        .orders
        .change_status(&tenant.context, id, status)
        .await?;
    Ok(ok(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted", body = Envelope<Deleted>),
        (status = 404, description = "Order not found", body = ErrorEnvelope),
        (status = 409, description = "Order is in progress or delivered", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "deleteOrder"
)]
#[delete("/orders/{id}")]
pub async fn delete_order(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, FieldName::new("id"))?;
    state.orders.delete(&tenant.context, id).await?;
    Ok(ok(Deleted { id: *id.as_uuid() }))
}

/// Assign or reassign the delivering courier.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/assignment",
    params(("id" = String, Path, description = "Order id")),
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Courier assigned", body = Envelope<OrderAssignment>),
        (status = 400, description = "Courier inactive", body = ErrorEnvelope),
        (status = 404, description = "Order or courier not found", body = ErrorEnvelope),
        (status = 409, description = "Order is terminal", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "assignCourier"
)]
#[put("/orders/{id}/assignment")]
pub async fn assign_courier(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<AssignmentRequest>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, FieldName::new("id"))?;
    let field = FieldName::new("courierId");
    let raw = require(payload.into_inner().courier_id, field)?;
    let courier: CourierId = parse_id(&raw, field)?;
    let assignment = state.orders.assign(&tenant.context, id, courier).await?;
    Ok(ok(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/assignment",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Assignment removed", body = Envelope<Deleted>),
        (status = 404, description = "Order not found", body = ErrorEnvelope),
        (status = 409, description = "Order is terminal", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "unassignCourier"
)]
#[delete("/orders/{id}/assignment")]
pub async fn unassign_courier(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, FieldName::new("id"))?;
    state.orders.unassign(&tenant.context, id).await?;
    Ok(ok(Deleted { id: *id.as_uuid() }))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    params(AssignmentQuery),
    responses(
        (status = 200, description = "Assignments", body = Envelope<Vec<OrderAssignment>>),
        (status = 400, description = "Invalid courier id", body = ErrorEnvelope)
    ),
    tags = ["orders"],
    operation_id = "listAssignments"
)]
#[get("/assignments")]
pub async fn list_assignments(
    state: web::Data<HttpState>,
    tenant: Tenant,
    query: web::Query<AssignmentQuery>,
) -> ApiResult<HttpResponse> {
    let courier = parse_optional_id(
        query.into_inner().courier_id.as_deref(),
        FieldName::new("courierId"),
    )?;
    let assignments = state.orders.assignments(&tenant.context, courier).await?;
    Ok(ok(assignments))
}
