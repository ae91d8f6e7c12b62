//! Port for order persistence.
//!
//! Orders hold stock: creating an order takes the reserved quantities out of
//! the product rows, editing it moves the difference, and cancelling or
//! deleting a pending order gives the stock back. Adapters apply the order
//! change and the stock movement in one transaction, and guard every
//! decrement so stock never goes negative.

use std::collections::BTreeMap;

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{
    CourierId, Order, OrderAssignment, OrderFilter, OrderId, OrderStatus, OrganizationId,
    Product, ProductId, Reservations,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "order repository query failed: {message}",
        /// A guarded stock decrement matched no row.
        InsufficientStock { product_id: ProductId } =>
            "insufficient stock for product {product_id}",
        /// The order no longer has the status the caller observed.
        StatusChanged => "order status changed concurrently",
    }
}

/// Storage for orders, their details and courier assignments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// One page of orders, newest first; fetches `page.fetch_limit()` rows.
    async fn list(
        &self,
        organization_id: &OrganizationId,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<Vec<Order>, OrderRepositoryError>;

    /// Fetch an order with its details and assignment.
    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &OrderId,
    ) -> Result<Option<Order>, OrderRepositoryError>;

    /// Insert `order` and take `reservations` out of stock. Returns the
    /// touched products with their new stock.
    async fn create(
        &self,
        order: &Order,
        reservations: &Reservations,
    ) -> Result<Vec<Product>, OrderRepositoryError>;

    /// Replace the details and header of a pending order and apply
    /// `stock_deltas` (positive takes stock, negative returns it). Fails with
    /// [`OrderRepositoryError::StatusChanged`] when the stored order is no
    /// longer pending.
    async fn replace(
        &self,
        order: &Order,
        stock_deltas: &BTreeMap<ProductId, i64>,
    ) -> Result<Vec<Product>, OrderRepositoryError>;

    /// Move `order` to its new status if the stored status is still
    /// `expected`, returning `restock` to the products.
    async fn update_status(
        &self,
        order: &Order,
        expected: OrderStatus,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError>;

    /// Delete an order if its stored status is still `expected`, returning
    /// `restock` to the products.
    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &OrderId,
        expected: OrderStatus,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError>;

    /// Insert or replace the courier assignment of an order.
    async fn assign(&self, assignment: &OrderAssignment) -> Result<(), OrderRepositoryError>;

    /// Remove the assignment of an order; `false` when there was none.
    async fn unassign(&self, order_id: &OrderId) -> Result<bool, OrderRepositoryError>;

    /// Assignments of the organization's orders, newest first.
    async fn list_assignments(
        &self,
        organization_id: &OrganizationId,
        courier_id: Option<CourierId>,
    ) -> Result<Vec<OrderAssignment>, OrderRepositoryError>;
}
