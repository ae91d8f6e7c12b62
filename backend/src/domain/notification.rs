//! In-app notifications for organization members.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    JoinRequest, NotificationId, Order, OrderId, OrderStatus, OrganizationId, Product, ProductId,
    UnknownStatus, User,
};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    OrderStatusChanged,
    LowStock,
    JoinRequest,
}

impl NotificationKind {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::OrderStatusChanged => "order_status_changed",
            Self::LowStock => "low_stock",
            Self::JoinRequest => "join_request",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_created" => Ok(Self::OrderCreated),
            "order_status_changed" => Ok(Self::OrderStatusChanged),
            "low_stock" => Ok(Self::LowStock),
            "join_request" => Ok(Self::JoinRequest),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[schema(value_type = String, format = Uuid)]
    pub id: NotificationId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub order_id: Option<OrderId>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub product_id: Option<ProductId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub organization_id: OrganizationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub order_id: Option<OrderId>,
    pub product_id: Option<ProductId>,
}

impl NewNotification {
    /// A new order was placed.
    pub fn order_created(order: &Order) -> Self {
        Self {
            organization_id: order.organization_id,
            kind: NotificationKind::OrderCreated,
            title: "New order".to_owned(),
            message: format!("Order {} was created for {}", order.id, order.total),
            order_id: Some(order.id),
            product_id: None,
        }
    }

    /// An order moved through the status machine.
    pub fn order_status_changed(order: &Order, previous: OrderStatus) -> Self {
        Self {
            organization_id: order.organization_id,
            kind: NotificationKind::OrderStatusChanged,
            title: "Order status changed".to_owned(),
            message: format!("Order {} moved from {previous} to {}", order.id, order.status),
            order_id: Some(order.id),
            product_id: None,
        }
    }

    /// A product's stock fell to or below the organization threshold.
    pub fn low_stock(product: &Product) -> Self {
        Self {
            organization_id: product.organization_id,
            kind: NotificationKind::LowStock,
            title: "Low stock".to_owned(),
            message: format!("{} has {} units left", product.name, product.stock),
            order_id: None,
            product_id: Some(product.id),
        }
    }

    /// A user asked to join the organization.
    pub fn join_request(request: &JoinRequest, requester: &User) -> Self {
        Self {
            organization_id: request.organization_id,
            kind: NotificationKind::JoinRequest,
            title: "Join request".to_owned(),
            message: format!(
                "{} ({}) asked to join the organization",
                requester.display_name, requester.email
            ),
            order_id: None,
            product_id: None,
        }
    }

    /// Stamp the notification for storage.
    pub fn into_notification(self, id: NotificationId, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            organization_id: self.organization_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            order_id: self.order_id,
            product_id: self.product_id,
            read: false,
            created_at,
        }
    }
}

/// Filters for notification listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub unread_only: bool,
}
