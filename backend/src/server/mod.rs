//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppConfig, ServerSettings};

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use backoffice::Trace;
#[cfg(debug_assertions)]
use backoffice::doc::ApiDoc;
use backoffice::inbound::http::error::{json_config, path_config, query_config};
use backoffice::inbound::http::health::{HealthState, live, ready};
use backoffice::inbound::http::state::HttpState;
use backoffice::outbound::persistence::{DbPool, run_migrations};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1").configure(backoffice::inbound::http::configure);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Prepare the database and construct the Actix HTTP server.
///
/// Migrations run first when enabled, then the pool and adapters are built.
/// The health state is marked ready once the listener is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when migrations fail, the pool cannot be
/// built, or binding the socket fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    settings: ServerSettings,
) -> std::io::Result<Server> {
    let ServerSettings {
        bind_addr,
        pool,
        verifier,
        run_migrations: migrate,
    } = settings;

    if migrate {
        run_migrations(pool.database_url())
            .await
            .map_err(std::io::Error::other)?;
    }
    let pool = DbPool::new(pool).await.map_err(std::io::Error::other)?;
    let http_state = web::Data::new(build_http_state(&pool, verifier)?);

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(bind_addr)?
        .run();

    info!(%bind_addr, "backoffice listening");
    health_state.mark_ready();
    Ok(server)
}
