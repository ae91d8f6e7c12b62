//! Orders (pedidos), their detail lines and courier assignments.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ClientId, CourierId, Money, MoneyError, OrderId, OrganizationId, ProductId};

/// Largest difference, in cents, tolerated between a submitted and a computed
/// total.
pub const TOTAL_TOLERANCE_CENTS: u64 = 1;

/// Raised when a status string is not one of the known order states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

/// Delivery lifecycle of an order.
///
/// ```text
/// pending ──► in_process ──► en_route ──► delivered
///    │             │             │
///    └─────────────┴─────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProcess,
    EnRoute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::EnRoute => "en_route",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Delivered and cancelled orders never change again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the status machine allows moving from `self` to `next`.
    ///
    /// # Examples
    /// ```
    /// use backoffice::domain::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.can_transition_to(OrderStatus::InProcess));
    /// assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    /// assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    /// ```
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProcess)
                | (Self::InProcess, Self::EnRoute)
                | (Self::EnRoute, Self::Delivered)
                | (Self::Pending | Self::InProcess | Self::EnRoute, Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_process" => Ok(Self::InProcess),
            "en_route" => Ok(Self::EnRoute),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_owned())),
        }
    }
}

/// Priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[schema(value_type = String, format = Uuid)]
    pub product_id: ProductId,
    pub quantity: u32,
    /// Catalog price when the order was composed.
    #[schema(value_type = f64)]
    pub unit_price: Money,
    #[schema(value_type = f64)]
    pub subtotal: Money,
}

/// Courier responsible for delivering an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderAssignment {
    #[schema(value_type = String, format = Uuid)]
    pub order_id: OrderId,
    #[schema(value_type = String, format = Uuid)]
    pub courier_id: CourierId,
    pub assigned_at: DateTime<Utc>,
}

/// A customer order with its detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[schema(value_type = String, format = Uuid)]
    pub id: OrderId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = String, format = Uuid)]
    pub client_id: ClientId,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub status: OrderStatus,
    #[schema(value_type = f64, example = 37.5)]
    pub total: Money,
    pub details: Vec<OrderDetail>,
    pub assignment: Option<OrderAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of `quantity × unit_price` over the detail lines.
    pub fn computed_total(&self) -> Result<Money, MoneyError> {
        self.details.iter().try_fold(Money::ZERO, |acc, detail| {
            detail
                .unit_price
                .checked_mul(detail.quantity)
                .and_then(|line| acc.checked_add(line))
        })
    }

    /// Whether the stored total agrees with the detail lines within
    /// [`TOTAL_TOLERANCE_CENTS`].
    pub fn total_matches_details(&self) -> bool {
        self.computed_total()
            .is_ok_and(|computed| computed.abs_diff_cents(self.total) <= TOTAL_TOLERANCE_CENTS)
    }

    /// Stock held by this order, summed per product.
    pub fn reserved_quantities(&self) -> BTreeMap<ProductId, u32> {
        let mut reserved = BTreeMap::new();
        for detail in &self.details {
            let entry = reserved.entry(detail.product_id).or_insert(0_u32);
            *entry = entry.saturating_add(detail.quantity);
        }
        reserved
    }
}

/// One submitted order line before validation.
///
/// Fields are optional and the quantity signed so that malformed input
/// reaches the composer and is reported with a precise error code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderLineDraft {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
}

/// Submitted order before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderDraft {
    pub client_id: Option<ClientId>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub details: Vec<OrderLineDraft>,
    /// Total the client believes the order costs.
    pub total: Option<Money>,
}

/// Filters for order listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_id: Option<ClientId>,
}
