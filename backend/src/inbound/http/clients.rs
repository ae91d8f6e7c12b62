//! Delivery clients.
//!
//! ```text
//! GET    /api/v1/clients?search&cursor&limit
//! POST   /api/v1/clients
//! GET    /api/v1/clients/{id}
//! PUT    /api/v1/clients/{id}
//! DELETE /api/v1/clients/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Client, ClientDraft, ClientId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Tenant;
use crate::inbound::http::envelope::{Deleted, Envelope, ErrorEnvelope, created, ok, paged};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, page_request, parse_id, parse_optional_email, require,
};

/// Client fields. Everything but the name is optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClientRequest {
    #[schema(example = "Grace Hopper")]
    pub name: Option<String>,
    #[schema(example = "+44 20 7946 0000")]
    pub phone: Option<String>,
    #[schema(example = "grace@example.com")]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClientQuery {
    /// Case-insensitive match on name, phone or email.
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

fn parse_client(payload: ClientRequest) -> Result<ClientDraft, Error> {
    let name = require(payload.name, FieldName::new("name"))?;
    let email = parse_optional_email(payload.email.as_deref(), FieldName::new("email"))?;
    ClientDraft::new(
        &name,
        payload.phone.as_deref(),
        email,
        payload.address.as_deref(),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    params(ClientQuery),
    responses(
        (status = 200, description = "Page of clients", body = Envelope<Vec<Client>>),
        (status = 400, description = "Invalid cursor", body = ErrorEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope)
    ),
    tags = ["clients"],
    operation_id = "listClients"
)]
#[get("/clients")]
pub async fn list_clients(
    state: web::Data<HttpState>,
    tenant: Tenant,
    query: web::Query<ClientQuery>,
) -> ApiResult<HttpResponse> {
    let ClientQuery {
        search,
        cursor,
        limit,
    } = query.into_inner();
    let page = page_request(cursor.as_deref(), limit)?;
    let search = search.filter(|term| !term.trim().is_empty());
    let clients = state.clients.list(&tenant.context, search, page).await?;
    Ok(paged(clients))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    request_body = ClientRequest,
    responses(
        (status = 201, description = "Client created", body = Envelope<Client>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope)
    ),
    tags = ["clients"],
    operation_id = "createClient"
)]
#[post("/clients")]
pub async fn create_client(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<ClientRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_client(payload.into_inner())?;
    let client = state.clients.create(&tenant.context, draft).await?;
    Ok(created(client))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client", body = Envelope<Client>),
        (status = 404, description = "Client not found", body = ErrorEnvelope)
    ),
    tags = ["clients"],
    operation_id = "getClient"
)]
#[get("/clients/{id}")]
pub async fn get_client(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ClientId = parse_id(&path, FieldName::new("id"))?;
    let client = state.clients.get(&tenant.context, id).await?;
    Ok(ok(client))
}

#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    params(("id" = String, Path, description = "Client id")),
    request_body = ClientRequest,
    responses(
        (status = 200, description = "Client updated", body = Envelope<Client>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 404, description = "Client not found", body = ErrorEnvelope)
    ),
    tags = ["clients"],
    operation_id = "updateClient"
)]
#[put("/clients/{id}")]
pub async fn update_client(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<ClientRequest>,
) -> ApiResult<HttpResponse> {
    let id: ClientId = parse_id(&path, FieldName::new("id"))?;
    let draft = parse_client(payload.into_inner())?;
    let client = state.clients.update(&tenant.context, id, draft).await?;
    Ok(ok(client))
}

/// Delete a client without order history.
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client deleted", body = Envelope<Deleted>),
        (status = 404, description = "Client not found", body = ErrorEnvelope),
        (status = 409, description = "Client has orders", body = ErrorEnvelope)
    ),
    tags = ["clients"],
    operation_id = "deleteClient"
)]
#[delete("/clients/{id}")]
pub async fn delete_client(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ClientId = parse_id(&path, FieldName::new("id"))?;
    state.clients.delete(&tenant.context, id).await?;
    Ok(ok(Deleted { id: *id.as_uuid() }))
}
