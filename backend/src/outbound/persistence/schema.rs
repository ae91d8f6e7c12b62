//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Tenants.
    organizations (id) {
        id -> Uuid,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Registered users, keyed by their Firebase UID.
    users (id) {
        id -> Uuid,
        /// Unique Firebase subject.
        firebase_uid -> Varchar,
        email -> Varchar,
        display_name -> Varchar,
        /// `admin` or `member`.
        role -> Varchar,
        /// `NULL` until the user creates or joins an organization.
        organization_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One settings row per organization.
    organization_settings (organization_id) {
        organization_id -> Uuid,
        contact_email -> Nullable<Varchar>,
        contact_phone -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        currency -> Varchar,
        low_stock_threshold -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Email invitations. At most one pending invitation per
    /// `(organization_id, email)`.
    invitations (id) {
        id -> Uuid,
        organization_id -> Uuid,
        email -> Varchar,
        invited_by -> Uuid,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Requests to join an organization. At most one pending request per
    /// `(organization_id, user_id)`.
    join_requests (id) {
        id -> Uuid,
        organization_id -> Uuid,
        user_id -> Uuid,
        message -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamptz,
        decided_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Product categories, unique by name within an organization.
    categories (id) {
        id -> Uuid,
        organization_id -> Uuid,
        name -> Varchar,
        description -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Catalog products. `stock` is guarded non-negative by a check constraint.
    products (id) {
        id -> Uuid,
        organization_id -> Uuid,
        category_id -> Nullable<Uuid>,
        name -> Varchar,
        description -> Nullable<Varchar>,
        /// Unit price in minor currency units.
        price_cents -> Int8,
        stock -> Int4,
        active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    clients (id) {
        id -> Uuid,
        organization_id -> Uuid,
        name -> Varchar,
        phone -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    couriers (id) {
        id -> Uuid,
        organization_id -> Uuid,
        name -> Varchar,
        phone -> Nullable<Varchar>,
        vehicle -> Nullable<Varchar>,
        active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Order headers. `total_cents` always equals the sum of the detail
    /// subtotals.
    orders (id) {
        id -> Uuid,
        organization_id -> Uuid,
        client_id -> Uuid,
        delivery_address -> Varchar,
        notes -> Nullable<Varchar>,
        status -> Varchar,
        total_cents -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Priced order lines in submission order.
    order_details (order_id, line_no) {
        order_id -> Uuid,
        line_no -> Int4,
        product_id -> Uuid,
        quantity -> Int4,
        unit_price_cents -> Int8,
        subtotal_cents -> Int8,
    }
}

diesel::table! {
    /// Current courier of an order.
    order_assignments (order_id) {
        order_id -> Uuid,
        courier_id -> Uuid,
        assigned_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        organization_id -> Uuid,
        kind -> Varchar,
        title -> Varchar,
        message -> Varchar,
        order_id -> Nullable<Uuid>,
        product_id -> Nullable<Uuid>,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(users -> organizations (organization_id));
diesel::joinable!(organization_settings -> organizations (organization_id));
diesel::joinable!(invitations -> organizations (organization_id));
diesel::joinable!(join_requests -> organizations (organization_id));
diesel::joinable!(categories -> organizations (organization_id));
diesel::joinable!(products -> categories (category_id));
diesel::joinable!(clients -> organizations (organization_id));
diesel::joinable!(couriers -> organizations (organization_id));
diesel::joinable!(orders -> clients (client_id));
diesel::joinable!(order_details -> orders (order_id));
diesel::joinable!(order_details -> products (product_id));
diesel::joinable!(order_assignments -> orders (order_id));
diesel::joinable!(order_assignments -> couriers (courier_id));
diesel::joinable!(notifications -> organizations (organization_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    users,
    organization_settings,
    invitations,
    join_requests,
    categories,
    products,
    clients,
    couriers,
    orders,
    order_details,
    order_assignments,
    notifications,
);
