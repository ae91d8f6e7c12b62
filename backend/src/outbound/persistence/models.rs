//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types return
//! `Err(String)` for rows that violate a domain invariant; repositories map
//! that message to their own query error.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryId, Client, ClientId, Courier, CourierId, CurrencyCode, DisplayName, Email,
    FirebaseUid, Invitation, InvitationId, InvitationStatus, JoinRequest, JoinRequestId,
    JoinRequestStatus, Money, Notification, NotificationId, NotificationKind, OrderAssignment,
    OrderDetail, OrderId, OrderStatus, Organization, OrganizationId, OrganizationSettings,
    Product, ProductId, Role, User, UserId,
};

use super::schema::{
    categories, clients, couriers, invitations, join_requests, notifications, order_assignments,
    order_details, orders, organization_settings, organizations, products, users,
};

fn to_u32(value: i32, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{column} is negative: {value}"))
}

/// Convert a domain count to an `INTEGER` column value.
pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32, String> {
    i32::try_from(value).map_err(|_| format!("{column} exceeds INTEGER range: {value}"))
}

fn to_money(cents: i64, column: &str) -> Result<Money, String> {
    Money::from_cents(cents).map_err(|err| format!("{column}: {err}"))
}

fn to_email(raw: String) -> Result<Email, String> {
    Email::new(raw).map_err(|err| err.to_string())
}

fn parse_column<T>(raw: &str, column: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err| format!("{column}: {err}"))
}

// ---------------------------------------------------------------------------
// Organizations and users
// ---------------------------------------------------------------------------

/// Row struct for the organizations table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<&Organization> for OrganizationRow {
    fn from(organization: &Organization) -> Self {
        Self {
            id: *organization.id.as_uuid(),
            name: organization.name.clone(),
            created_at: organization.created_at,
        }
    }
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub firebase_uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        Ok(User {
            id: UserId::from_uuid(self.id),
            firebase_uid: FirebaseUid::new(self.firebase_uid).map_err(|err| err.to_string())?,
            email: to_email(self.email)?,
            display_name: DisplayName::new(self.display_name).map_err(|err| err.to_string())?,
            role: parse_column::<Role>(&self.role, "role")?,
            organization_id: self.organization_id.map(OrganizationId::from_uuid),
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub firebase_uid: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            firebase_uid: user.firebase_uid.as_ref(),
            email: user.email.as_ref(),
            display_name: user.display_name.as_ref(),
            role: user.role.as_str(),
            organization_id: user.organization_id.map(|id| *id.as_uuid()),
            created_at: user.created_at,
        }
    }
}

/// Row struct for the organization_settings table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = organization_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SettingsRow {
    pub organization_id: Uuid,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub currency: String,
    pub low_stock_threshold: i32,
    pub updated_at: DateTime<Utc>,
}

impl SettingsRow {
    pub(crate) fn from_domain(settings: &OrganizationSettings) -> Result<Self, String> {
        Ok(Self {
            organization_id: *settings.organization_id.as_uuid(),
            contact_email: settings.contact_email.as_ref().map(|e| e.as_ref().to_owned()),
            contact_phone: settings.contact_phone.clone(),
            address: settings.address.clone(),
            currency: settings.currency.as_ref().to_owned(),
            low_stock_threshold: to_i32(settings.low_stock_threshold, "low_stock_threshold")?,
            updated_at: settings.updated_at,
        })
    }

    pub(crate) fn into_domain(self) -> Result<OrganizationSettings, String> {
        Ok(OrganizationSettings {
            organization_id: OrganizationId::from_uuid(self.organization_id),
            contact_email: self.contact_email.map(to_email).transpose()?,
            contact_phone: self.contact_phone,
            address: self.address,
            currency: CurrencyCode::new(&self.currency).map_err(|err| err.to_string())?,
            low_stock_threshold: to_u32(self.low_stock_threshold, "low_stock_threshold")?,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for the invitations table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InvitationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub invited_by: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl InvitationRow {
    pub(crate) fn from_domain(invitation: &Invitation) -> Self {
        Self {
            id: *invitation.id.as_uuid(),
            organization_id: *invitation.organization_id.as_uuid(),
            email: invitation.email.as_ref().to_owned(),
            invited_by: *invitation.invited_by.as_uuid(),
            status: invitation.status.as_str().to_owned(),
            created_at: invitation.created_at,
        }
    }

    pub(crate) fn into_domain(self) -> Result<Invitation, String> {
        Ok(Invitation {
            id: InvitationId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            email: to_email(self.email)?,
            invited_by: UserId::from_uuid(self.invited_by),
            status: parse_column::<InvitationStatus>(&self.status, "status")?,
            created_at: self.created_at,
        })
    }
}

/// Row struct for the join_requests table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = join_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct JoinRequestRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl JoinRequestRow {
    pub(crate) fn from_domain(request: &JoinRequest) -> Self {
        Self {
            id: *request.id.as_uuid(),
            organization_id: *request.organization_id.as_uuid(),
            user_id: *request.user_id.as_uuid(),
            message: request.message.clone(),
            status: request.status.as_str().to_owned(),
            created_at: request.created_at,
            decided_at: request.decided_at,
        }
    }

    pub(crate) fn into_domain(self) -> Result<JoinRequest, String> {
        Ok(JoinRequest {
            id: JoinRequestId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            user_id: UserId::from_uuid(self.user_id),
            message: self.message,
            status: parse_column::<JoinRequestStatus>(&self.status, "status")?,
            created_at: self.created_at,
            decided_at: self.decided_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Row struct for the categories table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CategoryRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            description: row.description,
        }
    }
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            id: *category.id.as_uuid(),
            organization_id: *category.organization_id.as_uuid(),
            name: category.name.clone(),
            description: category.description.clone(),
        }
    }
}

/// Row struct for the products table. `created_at` is left to the column
/// default.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
}

impl ProductRow {
    pub(crate) fn from_domain(product: &Product) -> Result<Self, String> {
        Ok(Self {
            id: *product.id.as_uuid(),
            organization_id: *product.organization_id.as_uuid(),
            category_id: product.category_id.map(|id| *id.as_uuid()),
            name: product.name.clone(),
            description: product.description.clone(),
            price_cents: product.price.cents(),
            stock: to_i32(product.stock, "stock")?,
            active: product.active,
        })
    }

    pub(crate) fn into_domain(self) -> Result<Product, String> {
        Ok(Product {
            id: ProductId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            category_id: self.category_id.map(CategoryId::from_uuid),
            name: self.name,
            description: self.description,
            price: to_money(self.price_cents, "price_cents")?,
            stock: to_u32(self.stock, "stock")?,
            active: self.active,
        })
    }
}

// ---------------------------------------------------------------------------
// Clients and couriers
// ---------------------------------------------------------------------------

/// Row struct for the clients table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ClientRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ClientRow {
    pub(crate) fn into_domain(self) -> Result<Client, String> {
        Ok(Client {
            id: ClientId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            name: self.name,
            phone: self.phone,
            email: self.email.map(to_email).transpose()?,
            address: self.address,
        })
    }
}

impl From<&Client> for ClientRow {
    fn from(client: &Client) -> Self {
        Self {
            id: *client.id.as_uuid(),
            organization_id: *client.organization_id.as_uuid(),
            name: client.name.clone(),
            phone: client.phone.clone(),
            email: client.email.as_ref().map(|e| e.as_ref().to_owned()),
            address: client.address.clone(),
        }
    }
}

/// Row struct for the couriers table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = couriers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CourierRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle: Option<String>,
    pub active: bool,
}

impl From<CourierRow> for Courier {
    fn from(row: CourierRow) -> Self {
        Self {
            id: CourierId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            phone: row.phone,
            vehicle: row.vehicle,
            active: row.active,
        }
    }
}

impl From<&Courier> for CourierRow {
    fn from(courier: &Courier) -> Self {
        Self {
            id: *courier.id.as_uuid(),
            organization_id: *courier.organization_id.as_uuid(),
            name: courier.name.clone(),
            phone: courier.phone.clone(),
            vehicle: courier.vehicle.clone(),
            active: courier.active,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Row struct for the orders table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub status: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Header columns rewritten when a pending order is edited.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OrderHeaderChanges<'a> {
    pub client_id: Uuid,
    pub delivery_address: &'a str,
    pub notes: Option<&'a str>,
    pub total_cents: i64,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for the order_details table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = order_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderDetailRow {
    pub order_id: Uuid,
    pub line_no: i32,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl OrderDetailRow {
    pub(crate) fn from_domain(
        order_id: OrderId,
        line_no: usize,
        detail: &OrderDetail,
    ) -> Result<Self, String> {
        Ok(Self {
            order_id: *order_id.as_uuid(),
            line_no: i32::try_from(line_no).map_err(|_| format!("line {line_no} out of range"))?,
            product_id: *detail.product_id.as_uuid(),
            quantity: to_i32(detail.quantity, "quantity")?,
            unit_price_cents: detail.unit_price.cents(),
            subtotal_cents: detail.subtotal.cents(),
        })
    }

    pub(crate) fn into_domain(self) -> Result<OrderDetail, String> {
        Ok(OrderDetail {
            product_id: ProductId::from_uuid(self.product_id),
            quantity: to_u32(self.quantity, "quantity")?,
            unit_price: to_money(self.unit_price_cents, "unit_price_cents")?,
            subtotal: to_money(self.subtotal_cents, "subtotal_cents")?,
        })
    }
}

/// Row struct for the order_assignments table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = order_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssignmentRow {
    pub order_id: Uuid,
    pub courier_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

impl From<AssignmentRow> for OrderAssignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            order_id: OrderId::from_uuid(row.order_id),
            courier_id: CourierId::from_uuid(row.courier_id),
            assigned_at: row.assigned_at,
        }
    }
}

impl From<&OrderAssignment> for AssignmentRow {
    fn from(assignment: &OrderAssignment) -> Self {
        Self {
            order_id: *assignment.order_id.as_uuid(),
            courier_id: *assignment.courier_id.as_uuid(),
            assigned_at: assignment.assigned_at,
        }
    }
}

/// Parse a stored order status.
pub(crate) fn parse_status(raw: &str) -> Result<OrderStatus, String> {
    parse_column::<OrderStatus>(raw, "status")
}

/// Parse a stored money column.
pub(crate) fn parse_money(cents: i64, column: &str) -> Result<Money, String> {
    to_money(cents, column)
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Row struct for the notifications table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRow {
    pub(crate) fn into_domain(self) -> Result<Notification, String> {
        Ok(Notification {
            id: NotificationId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            kind: parse_column::<NotificationKind>(&self.kind, "kind")?,
            title: self.title,
            message: self.message,
            order_id: self.order_id.map(OrderId::from_uuid),
            product_id: self.product_id.map(ProductId::from_uuid),
            read: self.read,
            created_at: self.created_at,
        })
    }
}

impl From<&Notification> for NotificationRow {
    fn from(notification: &Notification) -> Self {
        Self {
            id: *notification.id.as_uuid(),
            organization_id: *notification.organization_id.as_uuid(),
            kind: notification.kind.as_str().to_owned(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            order_id: notification.order_id.map(|id| *id.as_uuid()),
            product_id: notification.product_id.map(|id| *id.as_uuid()),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
