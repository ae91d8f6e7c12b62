//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`TokenVerifier`]) are implemented by
//! outbound adapters. Driving ports (`*Service`) are implemented by the
//! domain services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod catalog_repository;
mod catalog_service;
mod client_repository;
mod client_service;
mod courier_repository;
mod courier_service;
mod notification_repository;
mod notification_service;
mod order_repository;
mod order_service;
mod organization_repository;
mod organization_service;
mod token_verifier;
mod user_repository;

pub use account_service::AccountService;
#[cfg(test)]
pub use account_service::MockAccountService;
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::{CatalogRepository, CatalogRepositoryError, ProductRemoval};
pub use catalog_service::CatalogService;
#[cfg(test)]
pub use catalog_service::MockCatalogService;
#[cfg(test)]
pub use client_repository::MockClientRepository;
pub use client_repository::{ClientRepository, ClientRepositoryError};
pub use client_service::ClientService;
#[cfg(test)]
pub use client_service::MockClientService;
#[cfg(test)]
pub use courier_repository::MockCourierRepository;
pub use courier_repository::{CourierRepository, CourierRepositoryError};
pub use courier_service::CourierService;
#[cfg(test)]
pub use courier_service::MockCourierService;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use notification_service::MockNotificationService;
pub use notification_service::NotificationService;
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use order_service::MockOrderService;
pub use order_service::OrderService;
#[cfg(test)]
pub use organization_repository::MockOrganizationRepository;
pub use organization_repository::{OrganizationRepository, OrganizationRepositoryError};
#[cfg(test)]
pub use organization_service::MockOrganizationService;
pub use organization_service::OrganizationService;
#[cfg(test)]
pub use token_verifier::MockTokenVerifier;
pub use token_verifier::{FixtureTokenVerifier, TokenVerifier, TokenVerifierError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
