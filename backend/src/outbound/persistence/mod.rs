//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations translate between Diesel
//!   rows and domain types. Business rules stay in the domain services.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Transactional stock**: order writes and their stock movements share a
//!   transaction; decrements are guarded so stock never goes negative.
//! - **Strongly typed errors**: database errors map to the port error of the
//!   repository that raised them.
//!
//! # Example
//!
//! ```ignore
//! use backoffice::outbound::persistence::{DbPool, PoolConfig, DieselOrderRepository};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/backoffice")).await?;
//! let orders = DieselOrderRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_catalog_repository;
mod diesel_client_repository;
mod diesel_courier_repository;
mod diesel_helpers;
mod diesel_notification_repository;
mod diesel_order_repository;
mod diesel_organization_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_catalog_repository::DieselCatalogRepository;
pub use diesel_client_repository::DieselClientRepository;
pub use diesel_courier_repository::DieselCourierRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_organization_repository::DieselOrganizationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
