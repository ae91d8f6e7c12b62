//! HTTP inbound adapter exposing the REST API.
//!
//! Handlers translate requests into driving-port calls and wrap results in
//! the response envelope. Everything here except the health probes is mounted
//! under `/api/v1` by [`configure`].

pub mod accounts;
pub mod auth;
pub mod cache_control;
pub mod catalog;
pub mod clients;
pub mod couriers;
pub mod envelope;
pub mod error;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod organizations;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every authenticated API route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::register)
        .service(accounts::current_user)
        .service(organizations::create_organization)
        .service(organizations::current_organization)
        .service(organizations::list_members)
        .service(organizations::invite_member)
        .service(organizations::my_invitations)
        .service(organizations::accept_invitation)
        .service(organizations::request_to_join)
        .service(organizations::pending_requests)
        .service(organizations::decide_request)
        .service(organizations::get_settings)
        .service(organizations::update_settings)
        .service(catalog::list_categories)
        .service(catalog::create_category)
        .service(catalog::get_category)
        .service(catalog::update_category)
        .service(catalog::delete_category)
        .service(catalog::list_products)
        .service(catalog::create_product)
        .service(catalog::get_product)
        .service(catalog::update_product)
        .service(catalog::delete_product)
        .service(catalog::adjust_stock)
        .service(clients::list_clients)
        .service(clients::create_client)
        .service(clients::get_client)
        .service(clients::update_client)
        .service(clients::delete_client)
        .service(couriers::list_couriers)
        .service(couriers::create_courier)
        .service(couriers::get_courier)
        .service(couriers::update_courier)
        .service(couriers::delete_courier)
        .service(orders::list_orders)
        .service(orders::create_order)
        .service(orders::get_order)
        .service(orders::update_order)
        .service(orders::change_status)
        .service(orders::delete_order)
        .service(orders::assign_courier)
        .service(orders::unassign_courier)
        .service(orders::list_assignments)
        .service(notifications::list_notifications)
        .service(notifications::mark_read)
        .service(notifications::mark_all_read);
}
