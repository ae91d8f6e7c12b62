//! End-to-end HTTP flows through the real domain services.
//!
//! The application is assembled the way the server assembles it, with the
//! in-memory adapters from `test_support` standing in for Postgres and a
//! fixture verifier standing in for Firebase.

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use backoffice::Trace;
use backoffice::domain::{ProductId, TRACE_ID_HEADER};
use backoffice::domain::ports::FixtureTokenVerifier;
use backoffice::inbound::http::configure;
use backoffice::inbound::http::error::{json_config, path_config, query_config};
use backoffice::test_support::{InMemoryBackOffice, verified_identity};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const OWNER: &str = "owner-token";
const MEMBER: &str = "member-token";
const RIVAL: &str = "rival-token";
const STRANGER: &str = "stranger-token";

#[fixture]
fn store() -> InMemoryBackOffice {
    InMemoryBackOffice::new()
}

fn verifier() -> FixtureTokenVerifier {
    FixtureTokenVerifier::default()
        .with_identity(OWNER, verified_identity("owner-uid", "olive@example.com", "Olive"))
        .with_identity(MEMBER, verified_identity("member-uid", "milo@example.com", "Milo"))
        .with_identity(RIVAL, verified_identity("rival-uid", "rita@example.com", "Rita"))
        .with_identity(
            STRANGER,
            verified_identity("stranger-uid", "sam@example.com", "Sam"),
        )
}

fn back_office(
    store: &InMemoryBackOffice,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let state = store.http_state(verifier(), Arc::new(DefaultClock));
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure))
}

/// Send `request` as the holder of `token` and decode the JSON body.
async fn send<S>(app: &S, token: Option<&str>, request: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = match token {
        Some(token) => request.insert_header((AUTHORIZATION, format!("Bearer {token}"))),
        None => request,
    };
    let response = test::call_service(app, request.to_request()).await;
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let status = response.status();
    let bytes = test::read_body(response).await;
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

async fn get<S>(app: &S, token: &str, uri: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(app, Some(token), test::TestRequest::get().uri(uri)).await
}

async fn post<S>(app: &S, token: &str, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(app, Some(token), test::TestRequest::post().uri(uri).set_json(body)).await
}

async fn put<S>(app: &S, token: &str, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(app, Some(token), test::TestRequest::put().uri(uri).set_json(body)).await
}

async fn patch<S>(app: &S, token: &str, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(app, Some(token), test::TestRequest::patch().uri(uri).set_json(body)).await
}

async fn delete<S>(app: &S, token: &str, uri: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(app, Some(token), test::TestRequest::delete().uri(uri)).await
}

fn data_id(body: &Value) -> String {
    body["data"]["id"]
        .as_str()
        .expect("resource id")
        .to_owned()
}

fn code(body: &Value) -> &str {
    body["code"].as_str().unwrap_or_default()
}

/// Register the holder of `token` and make them admin of a new organization.
async fn onboard<S>(app: &S, token: &str, organization: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, _) = post(app, token, "/api/v1/auth/register", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = post(
        app,
        token,
        "/api/v1/organizations",
        json!({ "name": organization }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    data_id(&body)
}

async fn create_product<S>(app: &S, token: &str, stock: u32) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = post(
        app,
        token,
        "/api/v1/products",
        json!({ "name": "Widget", "price": 2.5, "stock": stock }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    data_id(&body)
}

async fn create_client<S>(app: &S, token: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = post(
        app,
        token,
        "/api/v1/clients",
        json!({ "name": "Cora", "phone": "555-0100", "address": "1 Main St" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    data_id(&body)
}

fn order_body(client: &str, product: &str, quantity: u32, total: Option<f64>) -> Value {
    let mut body = json!({
        "clientId": client,
        "deliveryAddress": "1 Main St",
        "details": [{ "productId": product, "quantity": quantity }],
    });
    if let Some(total) = total {
        body["total"] = json!(total);
    }
    body
}

fn stock(store: &InMemoryBackOffice, product: &str) -> Option<u32> {
    store.stock_of(&ProductId::parse(product).expect("product id"))
}

#[rstest]
#[actix_web::test]
async fn orders_reserve_stock_and_follow_the_delivery_lifecycle(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    onboard(&app, OWNER, "Acme").await;
    let product = create_product(&app, OWNER, 5).await;
    let client = create_client(&app, OWNER).await;

    let (status, body) = post(
        &app,
        OWNER,
        "/api/v1/orders",
        order_body(&client, &product, 6, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), "INSUFFICIENT_STOCK");

    let (status, body) = post(
        &app,
        OWNER,
        "/api/v1/orders",
        order_body(&client, &product, 2, Some(9.99)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), "TOTAL_MISMATCH");
    assert_eq!(stock(&store, &product), Some(5));

    let (status, body) = post(
        &app,
        OWNER,
        "/api/v1/orders",
        order_body(&client, &product, 2, Some(5.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["total"], json!(5.0));
    let order = data_id(&body);
    assert_eq!(stock(&store, &product), Some(3));

    let (_, body) = get(&app, OWNER, "/api/v1/notifications").await;
    let kinds: Vec<&str> = body["data"]
        .as_array()
        .expect("notification list")
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"order_created"), "{kinds:?}");
    assert!(kinds.contains(&"low_stock"), "{kinds:?}");

    let status_uri = format!("/api/v1/orders/{order}/status");
    let (status, _) = patch(&app, OWNER, &status_uri, json!({ "status": "in_process" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = patch(&app, OWNER, &status_uri, json!({ "status": "en_route" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), "COURIER_REQUIRED");

    let (status, body) = post(
        &app,
        OWNER,
        "/api/v1/couriers",
        json!({ "name": "Cal", "phone": "555-0111", "vehicle": "bike" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let courier = data_id(&body);
    let (status, body) = put(
        &app,
        OWNER,
        &format!("/api/v1/orders/{order}/assignment"),
        json!({ "courierId": courier }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["courierId"], json!(courier));

    let (status, _) = patch(&app, OWNER, &status_uri, json!({ "status": "en_route" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = delete(&app, OWNER, &format!("/api/v1/couriers/{courier}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "COURIER_BUSY");

    let (status, body) = patch(&app, OWNER, &status_uri, json!({ "status": "delivered" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assignment"]["courierId"], json!(courier));
    let (status, body) = delete(&app, OWNER, &format!("/api/v1/orders/{order}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "ORDER_NOT_DELETABLE");
    assert_eq!(stock(&store, &product), Some(3));
}

#[rstest]
#[actix_web::test]
async fn cancelling_returns_reserved_stock(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    onboard(&app, OWNER, "Acme").await;
    let product = create_product(&app, OWNER, 10).await;
    let client = create_client(&app, OWNER).await;

    let (_, body) = post(
        &app,
        OWNER,
        "/api/v1/orders",
        order_body(&client, &product, 4, None),
    )
    .await;
    let order = data_id(&body);
    assert_eq!(stock(&store, &product), Some(6));

    let (status, body) = delete(&app, OWNER, &format!("/api/v1/clients/{client}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "CLIENT_HAS_ORDERS");

    let (status, _) = patch(
        &app,
        OWNER,
        &format!("/api/v1/orders/{order}/status"),
        json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock(&store, &product), Some(10));

    let (status, body) = delete(&app, OWNER, &format!("/api/v1/orders/{order}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(order));
    assert_eq!(stock(&store, &product), Some(10));

    let (status, _) = delete(&app, OWNER, &format!("/api/v1/clients/{client}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn editing_a_pending_order_moves_only_the_difference(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    onboard(&app, OWNER, "Acme").await;
    let product = create_product(&app, OWNER, 10).await;
    let client = create_client(&app, OWNER).await;

    let (_, body) = post(
        &app,
        OWNER,
        "/api/v1/orders",
        order_body(&client, &product, 3, None),
    )
    .await;
    let order = data_id(&body);
    assert_eq!(stock(&store, &product), Some(7));

    let (status, body) = put(
        &app,
        OWNER,
        &format!("/api/v1/orders/{order}"),
        order_body(&client, &product, 5, Some(12.5)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total"], json!(12.5));
    assert_eq!(stock(&store, &product), Some(5));

    let (status, body) = put(
        &app,
        OWNER,
        &format!("/api/v1/orders/{order}"),
        order_body(&client, &product, 16, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), "INSUFFICIENT_STOCK");
    assert_eq!(stock(&store, &product), Some(5));
}

#[rstest]
#[actix_web::test]
async fn join_requests_admit_members(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    let organization = onboard(&app, OWNER, "Acme").await;

    let (status, _) = post(&app, MEMBER, "/api/v1/auth/register", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = get(&app, MEMBER, "/api/v1/organization").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "NO_ORGANIZATION");

    let (status, body) = post(
        &app,
        MEMBER,
        "/api/v1/organization-requests",
        json!({ "organizationId": organization, "message": "Hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let request = data_id(&body);

    let (status, body) = get(&app, OWNER, "/api/v1/organization/requests").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = post(
        &app,
        OWNER,
        &format!("/api/v1/organization/requests/{request}/decision"),
        json!({ "approve": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "approved");

    let (_, body) = get(&app, MEMBER, "/api/v1/me").await;
    assert_eq!(body["data"]["organizationId"], json!(organization));
    assert_eq!(body["data"]["role"], "member");

    let (status, body) = get(&app, MEMBER, "/api/v1/organization/requests").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code(&body), "FORBIDDEN");

    let (_, body) = get(&app, OWNER, "/api/v1/organization/members").await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[actix_web::test]
async fn invitations_attach_the_invited_user(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    let organization = onboard(&app, OWNER, "Acme").await;

    let (status, body) = post(
        &app,
        OWNER,
        "/api/v1/organization/invitations",
        json!({ "email": "milo@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let invitation = data_id(&body);

    post(&app, MEMBER, "/api/v1/auth/register", json!({})).await;
    let (_, body) = get(&app, MEMBER, "/api/v1/invitations").await;
    assert_eq!(body["data"][0]["id"], json!(invitation));

    let (status, body) = post(
        &app,
        MEMBER,
        &format!("/api/v1/invitations/{invitation}/accept"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["id"], json!(organization));
}

#[rstest]
#[actix_web::test]
async fn organizations_cannot_see_each_other(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    onboard(&app, OWNER, "Acme").await;
    let product = create_product(&app, OWNER, 5).await;
    onboard(&app, RIVAL, "Globex").await;

    let (status, body) = get(&app, RIVAL, &format!("/api/v1/products/{product}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code(&body), "PRODUCT_NOT_FOUND");

    let (status, body) = get(&app, RIVAL, "/api/v1/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = patch(
        &app,
        RIVAL,
        &format!("/api/v1/products/{product}/stock"),
        json!({ "delta": -5 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(stock(&store, &product), Some(5));
}

#[rstest]
#[actix_web::test]
async fn listings_page_with_cursors(store: InMemoryBackOffice) {
    let app = test::init_service(back_office(&store)).await;
    onboard(&app, OWNER, "Acme").await;
    for _ in 0..3 {
        create_client(&app, OWNER).await;
    }

    let (_, first) = get(&app, OWNER, "/api/v1/clients?limit=2").await;
    assert_eq!(first["data"].as_array().map(Vec::len), Some(2));
    let cursor = first["pagination"]["nextCursor"]
        .as_str()
        .expect("next cursor")
        .to_owned();

    let (_, second) = get(&app, OWNER, &format!("/api/v1/clients?limit=2&cursor={cursor}")).await;
    assert_eq!(second["data"].as_array().map(Vec::len), Some(1));
    assert!(second["pagination"]["nextCursor"].is_null());
}

#[rstest]
#[case::no_token(None, "/api/v1/me")]
#[case::unknown_token(Some("forged"), "/api/v1/me")]
#[case::unregistered_user(Some(STRANGER), "/api/v1/orders")]
#[actix_web::test]
async fn unauthenticated_requests_are_rejected(
    store: InMemoryBackOffice,
    #[case] token: Option<&str>,
    #[case] uri: &str,
) {
    let app = test::init_service(back_office(&store)).await;
    let (status, body) = send(&app, token, test::TestRequest::get().uri(uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}
