//! Builders wiring the PostgreSQL and Firebase adapters into HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use backoffice::inbound::http::state::{Adapters, HttpState};
use backoffice::outbound::firebase::{FirebaseTokenVerifier, FirebaseVerifierConfig};
use backoffice::outbound::persistence::{
    DbPool, DieselCatalogRepository, DieselClientRepository, DieselCourierRepository,
    DieselNotificationRepository, DieselOrderRepository, DieselOrganizationRepository,
    DieselUserRepository,
};

/// Diesel repositories sharing one pool.
fn diesel_adapters(
    pool: &DbPool,
    verifier: FirebaseTokenVerifier,
) -> Adapters<
    FirebaseTokenVerifier,
    DieselUserRepository,
    DieselOrganizationRepository,
    DieselCatalogRepository,
    DieselClientRepository,
    DieselCourierRepository,
    DieselOrderRepository,
    DieselNotificationRepository,
> {
    Adapters {
        verifier: Arc::new(verifier),
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        organizations: Arc::new(DieselOrganizationRepository::new(pool.clone())),
        catalog: Arc::new(DieselCatalogRepository::new(pool.clone())),
        clients: Arc::new(DieselClientRepository::new(pool.clone())),
        couriers: Arc::new(DieselCourierRepository::new(pool.clone())),
        orders: Arc::new(DieselOrderRepository::new(pool.clone())),
        notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
    }
}

/// Build the HTTP state backed by `pool` and the Firebase verifier.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the verifier's HTTP client cannot be built.
pub(crate) fn build_http_state(
    pool: &DbPool,
    verifier: FirebaseVerifierConfig,
) -> std::io::Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let verifier = FirebaseTokenVerifier::new(verifier, clock.clone()).map_err(|err| {
        std::io::Error::other(format!("failed to build Firebase token verifier: {err}"))
    })?;
    Ok(HttpState::wire(diesel_adapters(pool, verifier), clock))
}
