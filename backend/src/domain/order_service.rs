//! Order composition, lifecycle and courier assignment.
//!
//! Creation and editing run the draft through [`check_draft`] and
//! [`OrderComposer`] against a fresh catalog snapshot before anything is
//! written. The repository then applies the order and its stock movement
//! atomically, so a concurrent order that wins the race for the last units
//! surfaces here as `INSUFFICIENT_STOCK`.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::catalog_service::map_catalog_error;
use crate::domain::client_service::{client_not_found, map_client_error};
use crate::domain::courier_service::{courier_not_found, map_courier_error};
use crate::domain::ports::{
    CatalogRepository, ClientRepository, CourierRepository, OrderRepository,
    OrderRepositoryError, OrderService,
};
use crate::domain::{
    CheckedDraft, ClientId, ComposedOrder, CourierId, Error, ErrorCode, LowStockMonitor,
    NewNotification, NotificationPublisher, Order, OrderAssignment, OrderComposer, OrderDraft,
    OrderFilter, OrderId, OrderStatus, Reservations, TenantContext, check_draft,
};

fn map_order_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
        OrderRepositoryError::InsufficientStock { product_id } => Error::new(
            ErrorCode::InsufficientStock,
            "not enough stock to fulfil the order",
        )
        .with_details(json!({ "productId": product_id })),
        OrderRepositoryError::StatusChanged => {
            Error::conflict("order was modified concurrently; reload and retry")
        }
    }
}

fn order_not_found() -> Error {
    Error::new(ErrorCode::OrderNotFound, "order not found")
}

fn audit_total(order: &Order) {
    if !order.total_matches_details() {
        warn!(
            order_id = %order.id,
            total = %order.total,
            "stored order total disagrees with its details"
        );
    }
}

/// Ports and helpers the order service depends on.
#[derive(Clone)]
pub struct OrderServiceDeps {
    pub orders: Arc<dyn OrderRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub couriers: Arc<dyn CourierRepository>,
    pub notifications: NotificationPublisher,
    pub low_stock: LowStockMonitor,
    pub clock: Arc<dyn Clock>,
}

/// Order service implementing the driving port.
#[derive(Clone)]
pub struct OrderServiceImpl {
    deps: OrderServiceDeps,
}

impl OrderServiceImpl {
    /// Create a new service.
    pub fn new(deps: OrderServiceDeps) -> Self {
        Self { deps }
    }

    async fn load(&self, tenant: &TenantContext, id: &OrderId) -> Result<Order, Error> {
        let order = self
            .deps
            .orders
            .find(&tenant.organization_id, id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(order_not_found)?;
        audit_total(&order);
        Ok(order)
    }

    async fn ensure_client(&self, tenant: &TenantContext, id: &ClientId) -> Result<(), Error> {
        self.deps
            .clients
            .find(&tenant.organization_id, id)
            .await
            .map_err(map_client_error)?
            .map(|_| ())
            .ok_or_else(|| client_not_found().with_details(json!({ "clientId": id })))
    }

    /// Client check, catalog snapshot and composition.
    async fn compose(
        &self,
        tenant: &TenantContext,
        checked: CheckedDraft,
        already_reserved: &Reservations,
    ) -> Result<ComposedOrder, Error> {
        self.ensure_client(tenant, &checked.client_id).await?;
        let products = self
            .deps
            .catalog
            .find_products(&tenant.organization_id, &checked.product_ids())
            .await
            .map_err(map_catalog_error)?;
        OrderComposer::new(&products, already_reserved).compose(checked)
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    async fn list(
        &self,
        tenant: &TenantContext,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, Error> {
        let rows = self
            .deps
            .orders
            .list(&tenant.organization_id, &filter, &page)
            .await
            .map_err(map_order_error)?;
        rows.iter().for_each(audit_total);
        Ok(Page::from_overfetch(rows, page))
    }

    async fn get(&self, tenant: &TenantContext, id: OrderId) -> Result<Order, Error> {
        self.load(tenant, &id).await
    }

    async fn create(&self, tenant: &TenantContext, draft: OrderDraft) -> Result<Order, Error> {
        let checked = check_draft(draft)?;
        let composed = self.compose(tenant, checked, &Reservations::new()).await?;

        let now = self.deps.clock.utc();
        let order = Order {
            id: OrderId::random(),
            organization_id: tenant.organization_id,
            client_id: composed.client_id,
            delivery_address: composed.delivery_address,
            notes: composed.notes,
            status: OrderStatus::Pending,
            total: composed.total,
            details: composed.details,
            assignment: None,
            created_at: now,
            updated_at: now,
        };
        let touched = self
            .deps
            .orders
            .create(&order, &composed.reservations)
            .await
            .map_err(map_order_error)?;
        info!(
            order_id = %order.id,
            organization_id = %tenant.organization_id,
            total = %order.total,
            lines = order.details.len(),
            "created order"
        );

        self.deps
            .notifications
            .publish(NewNotification::order_created(&order))
            .await;
        self.deps
            .low_stock
            .check(&tenant.organization_id, &touched)
            .await;
        Ok(order)
    }

    async fn update(
        &self,
        tenant: &TenantContext,
        id: OrderId,
        draft: OrderDraft,
    ) -> Result<Order, Error> {
        let current = self.load(tenant, &id).await?;
        if current.status != OrderStatus::Pending {
            return Err(not_editable(current.status));
        }
        let checked = check_draft(draft)?;
        let previous = current.reserved_quantities();
        let composed = self.compose(tenant, checked, &previous).await?;
        let deltas = composed.stock_deltas(&previous);

        let order = Order {
            client_id: composed.client_id,
            delivery_address: composed.delivery_address,
            notes: composed.notes,
            total: composed.total,
            details: composed.details,
            updated_at: self.deps.clock.utc(),
            ..current
        };
        let touched = match self.deps.orders.replace(&order, &deltas).await {
            Ok(touched) => touched,
            Err(OrderRepositoryError::StatusChanged) => return Err(not_editable(order.status)),
            Err(other) => return Err(map_order_error(other)),
        };
        info!(order_id = %order.id, total = %order.total, "updated order");

        let drained: Vec<_> = touched
            .into_iter()
            .filter(|product| deltas.get(&product.id).is_some_and(|delta| *delta > 0))
            .collect();
        self.deps
            .low_stock
            .check(&tenant.organization_id, &drained)
            .await;
        Ok(order)
    }

    async fn change_status(
        &self,
        tenant: &TenantContext,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, Error> {
        let current = self.load(tenant, &id).await?;
        let previous = current.status;
        if !previous.can_transition_to(status) {
            return Err(Error::new(
                ErrorCode::InvalidStatusTransition,
                format!("cannot move an order from {previous} to {status}"),
            )
            .with_details(json!({ "from": previous, "to": status })));
        }
        if status == OrderStatus::EnRoute && current.assignment.is_none() {
            return Err(Error::new(
                ErrorCode::CourierRequired,
                "assign a courier before the order goes en route",
            ));
        }

        let restock = if status == OrderStatus::Cancelled {
            current.reserved_quantities()
        } else {
            Reservations::new()
        };
        let order = Order {
            status,
            updated_at: self.deps.clock.utc(),
            ..current
        };
        self.deps
            .orders
            .update_status(&order, previous, &restock)
            .await
            .map_err(map_order_error)?;
        info!(order_id = %order.id, from = %previous, to = %status, "order status changed");

        self.deps
            .notifications
            .publish(NewNotification::order_status_changed(&order, previous))
            .await;
        Ok(order)
    }

    async fn delete(&self, tenant: &TenantContext, id: OrderId) -> Result<(), Error> {
        let current = self.load(tenant, &id).await?;
        let restock = match current.status {
            OrderStatus::Pending => current.reserved_quantities(),
            OrderStatus::Cancelled => Reservations::new(),
            other => {
                return Err(Error::new(
                    ErrorCode::OrderNotDeletable,
                    format!("{other} orders cannot be deleted"),
                )
                .with_details(json!({ "status": other })));
            }
        };
        self.deps
            .orders
            .delete(&tenant.organization_id, &id, current.status, &restock)
            .await
            .map_err(map_order_error)?;
        info!(order_id = %id, status = %current.status, "deleted order");
        Ok(())
    }

    async fn assign(
        &self,
        tenant: &TenantContext,
        id: OrderId,
        courier: CourierId,
    ) -> Result<OrderAssignment, Error> {
        let order = self.load(tenant, &id).await?;
        if order.status.is_terminal() {
            return Err(not_assignable(order.status));
        }
        let found = self
            .deps
            .couriers
            .find(&tenant.organization_id, &courier)
            .await
            .map_err(map_courier_error)?
            .ok_or_else(courier_not_found)?;
        if !found.active {
            return Err(Error::new(
                ErrorCode::CourierInactive,
                "courier is inactive",
            )
            .with_details(json!({ "courierId": courier })));
        }

        let assignment = OrderAssignment {
            order_id: order.id,
            courier_id: found.id,
            assigned_at: self.deps.clock.utc(),
        };
        self.deps
            .orders
            .assign(&assignment)
            .await
            .map_err(map_order_error)?;
        info!(order_id = %order.id, courier_id = %found.id, "assigned courier");
        Ok(assignment)
    }

    async fn unassign(&self, tenant: &TenantContext, id: OrderId) -> Result<(), Error> {
        let order = self.load(tenant, &id).await?;
        if order.status.is_terminal() {
            return Err(not_assignable(order.status));
        }
        let removed = self
            .deps
            .orders
            .unassign(&order.id)
            .await
            .map_err(map_order_error)?;
        if !removed {
            return Err(Error::not_found("order has no courier assigned"));
        }
        info!(order_id = %order.id, "unassigned courier");
        Ok(())
    }

    async fn assignments(
        &self,
        tenant: &TenantContext,
        courier: Option<CourierId>,
    ) -> Result<Vec<OrderAssignment>, Error> {
        self.deps
            .orders
            .list_assignments(&tenant.organization_id, courier)
            .await
            .map_err(map_order_error)
    }
}

fn not_editable(status: OrderStatus) -> Error {
    Error::new(
        ErrorCode::OrderNotEditable,
        "only pending orders can be edited",
    )
    .with_details(json!({ "status": status }))
}

fn not_assignable(status: OrderStatus) -> Error {
    Error::new(
        ErrorCode::OrderNotAssignable,
        format!("{status} orders cannot change courier"),
    )
    .with_details(json!({ "status": status }))
}
