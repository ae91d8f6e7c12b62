//! Driving port for orders.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    CourierId, Error, Order, OrderAssignment, OrderDraft, OrderFilter, OrderId, OrderStatus,
    TenantContext,
};

/// Order composition, lifecycle and courier assignment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn list(
        &self,
        tenant: &TenantContext,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, Error>;

    async fn get(&self, tenant: &TenantContext, id: OrderId) -> Result<Order, Error>;

    /// Validate, price and store a new order, reserving its stock.
    ///
    /// # Errors
    ///
    /// In check order: `MISSING_FIELDS`, `INVALID_QUANTITY`,
    /// `CLIENT_NOT_FOUND`, `PRODUCT_NOT_FOUND`, `PRODUCT_INACTIVE`,
    /// `INSUFFICIENT_STOCK`, `TOTAL_MISMATCH`.
    async fn create(&self, tenant: &TenantContext, draft: OrderDraft) -> Result<Order, Error>;

    /// Recompose a pending order, moving only the stock difference.
    async fn update(
        &self,
        tenant: &TenantContext,
        id: OrderId,
        draft: OrderDraft,
    ) -> Result<Order, Error>;

    /// Move an order through the status machine.
    async fn change_status(
        &self,
        tenant: &TenantContext,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, Error>;

    /// Delete a pending or cancelled order.
    async fn delete(&self, tenant: &TenantContext, id: OrderId) -> Result<(), Error>;

    /// Assign an active courier, replacing any previous one.
    async fn assign(
        &self,
        tenant: &TenantContext,
        id: OrderId,
        courier: CourierId,
    ) -> Result<OrderAssignment, Error>;

    async fn unassign(&self, tenant: &TenantContext, id: OrderId) -> Result<(), Error>;

    async fn assignments(
        &self,
        tenant: &TenantContext,
        courier: Option<CourierId>,
    ) -> Result<Vec<OrderAssignment>, Error>;
}
