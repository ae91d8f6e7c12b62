//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities of the delivery back office,
//! the order composition engine, and the services that implement the driving
//! ports. Nothing in here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode / ErrorKind: transport agnostic failures.
//! - Ids and [`Money`]: value objects shared by every aggregate.
//! - Organization, User, Category, Product, Client, Courier, Order,
//!   Notification: the aggregates.
//! - [`OrderComposer`]: prices and validates order drafts.
//! - `*ServiceImpl`: implementations of the driving ports in [`ports`].

pub mod account_service;
pub mod catalog;
pub mod catalog_service;
pub mod client;
pub mod client_service;
pub mod courier;
pub mod courier_service;
pub mod error;
pub mod ids;
pub mod money;
pub mod notification;
pub mod notification_service;
pub mod order;
pub mod order_composition;
pub mod order_service;
pub mod organization;
pub mod organization_service;
pub mod ports;
pub mod text;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountServiceImpl;
pub use self::catalog::{
    CATALOG_DESCRIPTION_MAX, CATALOG_NAME_MAX, Category, CategoryDraft, Product, ProductDraft,
    ProductFilter,
};
pub use self::catalog_service::CatalogServiceImpl;
pub use self::client::{ADDRESS_MAX, CLIENT_NAME_MAX, Client, ClientDraft, PHONE_MAX};
pub use self::client_service::ClientServiceImpl;
pub use self::courier::{COURIER_NAME_MAX, Courier, CourierDraft, VEHICLE_MAX};
pub use self::courier_service::CourierServiceImpl;
pub use self::error::{Error, ErrorCode, ErrorKind, ErrorValidationError, TRACE_ID_HEADER};
pub use self::ids::{
    CategoryId, ClientId, CourierId, IdParseError, InvitationId, JoinRequestId, NotificationId,
    OrderId, OrganizationId, ProductId, UserId,
};
pub use self::money::{Money, MoneyError};
pub use self::notification::{
    NewNotification, Notification, NotificationFilter, NotificationKind,
};
pub use self::notification_service::{
    LowStockMonitor, NotificationPublisher, NotificationServiceImpl,
};
pub use self::order::{
    Order, OrderAssignment, OrderDetail, OrderDraft, OrderFilter, OrderLineDraft, OrderStatus,
    TOTAL_TOLERANCE_CENTS, UnknownOrderStatus,
};
pub use self::order_composition::{
    CheckedDraft, CheckedLine, ComposedOrder, DELIVERY_ADDRESS_MAX, MAX_ORDER_LINES,
    ORDER_NOTES_MAX, OrderComposer, Reservations, check_draft,
};
pub use self::order_service::{OrderServiceDeps, OrderServiceImpl};
pub use self::organization::{
    CurrencyCode, DEFAULT_CURRENCY, DEFAULT_LOW_STOCK_THRESHOLD, Invitation, InvitationStatus,
    JoinRequest, JoinRequestStatus, ORGANIZATION_NAME_MAX, Organization, OrganizationSettings,
    SettingsUpdate, UnknownStatus,
};
pub use self::organization_service::OrganizationServiceImpl;
pub use self::text::{optional_text, required_text};
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, Email, FirebaseUid, Role, TenantContext, User, UserValidationError,
    VerifiedIdentity,
};
