//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountService, CatalogRepository, CatalogService, ClientRepository, ClientService,
    CourierRepository, CourierService, NotificationRepository, NotificationService,
    OrderRepository, OrderService, OrganizationRepository, OrganizationService, TokenVerifier,
    UserRepository,
};
use crate::domain::{
    AccountServiceImpl, CatalogServiceImpl, ClientServiceImpl, CourierServiceImpl,
    LowStockMonitor, NotificationPublisher, NotificationServiceImpl, OrderServiceDeps,
    OrderServiceImpl, OrganizationServiceImpl,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub organizations: Arc<dyn OrganizationService>,
    pub catalog: Arc<dyn CatalogService>,
    pub clients: Arc<dyn ClientService>,
    pub couriers: Arc<dyn CourierService>,
    pub orders: Arc<dyn OrderService>,
    pub notifications: Arc<dyn NotificationService>,
}

/// Driven adapters the domain services are built from.
pub struct Adapters<V, U, O, C, Cl, Co, Or, N> {
    pub verifier: Arc<V>,
    pub users: Arc<U>,
    pub organizations: Arc<O>,
    pub catalog: Arc<C>,
    pub clients: Arc<Cl>,
    pub couriers: Arc<Co>,
    pub orders: Arc<Or>,
    pub notifications: Arc<N>,
}

impl HttpState {
    /// Build every domain service over `adapters` and expose them as driving
    /// ports.
    pub fn wire<V, U, O, C, Cl, Co, Or, N>(
        adapters: Adapters<V, U, O, C, Cl, Co, Or, N>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        V: TokenVerifier + 'static,
        U: UserRepository + 'static,
        O: OrganizationRepository + 'static,
        C: CatalogRepository + 'static,
        Cl: ClientRepository + 'static,
        Co: CourierRepository + 'static,
        Or: OrderRepository + 'static,
        N: NotificationRepository + 'static,
    {
        let Adapters {
            verifier,
            users,
            organizations,
            catalog,
            clients,
            couriers,
            orders,
            notifications,
        } = adapters;

        let publisher = NotificationPublisher::new(notifications.clone(), clock.clone());
        let low_stock = LowStockMonitor::new(organizations.clone(), publisher.clone());

        let order_service = OrderServiceImpl::new(OrderServiceDeps {
            orders,
            catalog: catalog.clone(),
            clients: clients.clone(),
            couriers: couriers.clone(),
            notifications: publisher.clone(),
            low_stock: low_stock.clone(),
            clock: clock.clone(),
        });

        Self {
            accounts: Arc::new(AccountServiceImpl::new(
                verifier,
                users.clone(),
                clock.clone(),
            )),
            organizations: Arc::new(OrganizationServiceImpl::new(
                organizations,
                users,
                publisher,
                clock,
            )),
            catalog: Arc::new(CatalogServiceImpl::new(catalog, low_stock)),
            clients: Arc::new(ClientServiceImpl::new(clients)),
            couriers: Arc::new(CourierServiceImpl::new(couriers)),
            orders: Arc::new(order_service),
            notifications: Arc::new(NotificationServiceImpl::new(notifications)),
        }
    }
}
