//! Back-office entry-point: loads configuration, wires adapters and serves
//! the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::Context;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backoffice::inbound::http::health::HealthState;
use server::{AppConfig, create_server};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = AppConfig::load().wrap_err("failed to load configuration")?;
    let settings = config.validate().wrap_err("invalid configuration")?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), settings)
        .await
        .wrap_err("failed to start server")?;

    let result = server.await;
    health_state.mark_unhealthy();
    info!("server stopped");
    result.wrap_err("server terminated with an error")
}
