//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Every write runs in one transaction together with its stock movement.
//! Decrements are guarded with `stock >= quantity`; a guard that matches no
//! row aborts the transaction with
//! [`OrderRepositoryError::InsufficientStock`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{
    ClientId, CourierId, Order, OrderAssignment, OrderFilter, OrderId, OrderStatus,
    OrganizationId, Product, ProductId, Reservations,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{TxError, collect_rows, page_window};
use super::models::{
    AssignmentRow, OrderDetailRow, OrderHeaderChanges, OrderRow, ProductRow, parse_money,
    parse_status, to_i32,
};
use super::pool::{DbPool, PoolError};
use super::schema::{order_assignments, order_details, orders, products};

type Tx = TxError<OrderRepositoryError>;

/// Diesel-backed implementation of the `OrderRepository` port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_basic_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_basic_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn map_tx_error(error: Tx) -> OrderRepositoryError {
    error.resolve(map_diesel_error)
}

fn row_error(message: String) -> Tx {
    TxError::Domain(OrderRepositoryError::query(message))
}

fn order_row(order: &Order) -> OrderRow {
    OrderRow {
        id: *order.id.as_uuid(),
        organization_id: *order.organization_id.as_uuid(),
        client_id: *order.client_id.as_uuid(),
        delivery_address: order.delivery_address.clone(),
        notes: order.notes.clone(),
        status: order.status.as_str().to_owned(),
        total_cents: order.total.cents(),
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}

fn detail_rows(order: &Order) -> Result<Vec<OrderDetailRow>, String> {
    order
        .details
        .iter()
        .enumerate()
        .map(|(line_no, detail)| OrderDetailRow::from_domain(order.id, line_no, detail))
        .collect()
}

/// Build a domain order from its header, detail rows (in line order) and
/// optional assignment.
fn assemble(
    row: OrderRow,
    details: Vec<OrderDetailRow>,
    assignment: Option<AssignmentRow>,
) -> Result<Order, String> {
    let details = details
        .into_iter()
        .map(OrderDetailRow::into_domain)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Order {
        id: OrderId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        client_id: ClientId::from_uuid(row.client_id),
        delivery_address: row.delivery_address,
        notes: row.notes,
        status: parse_status(&row.status)?,
        total: parse_money(row.total_cents, "total_cents")?,
        details,
        assignment: assignment.map(OrderAssignment::from),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, OrderRepositoryError> {
    collect_rows(
        rows.into_iter().map(ProductRow::into_domain),
        OrderRepositoryError::query,
    )
}

/// Remove `quantity` units from a product, failing when not enough remain.
async fn take_stock(
    conn: &mut AsyncPgConnection,
    organization_id: Uuid,
    product_id: ProductId,
    quantity: i32,
) -> Result<ProductRow, Tx> {
    let row: Option<ProductRow> = diesel::update(
        products::table
            .filter(products::id.eq(*product_id.as_uuid()))
            .filter(products::organization_id.eq(organization_id))
            .filter(products::stock.ge(quantity)),
    )
    .set(products::stock.eq(products::stock - quantity))
    .returning(ProductRow::as_returning())
    .get_result(conn)
    .await
    .optional()?;
    row.ok_or(TxError::Domain(OrderRepositoryError::insufficient_stock(
        product_id,
    )))
}

/// Give `quantity` units back to a product.
async fn return_stock(
    conn: &mut AsyncPgConnection,
    organization_id: Uuid,
    product_id: ProductId,
    quantity: i32,
) -> Result<Option<ProductRow>, Tx> {
    let row = diesel::update(
        products::table
            .filter(products::id.eq(*product_id.as_uuid()))
            .filter(products::organization_id.eq(organization_id)),
    )
    .set(products::stock.eq(products::stock + quantity))
    .returning(ProductRow::as_returning())
    .get_result(conn)
    .await
    .optional()?;
    Ok(row)
}

async fn restock_all(
    conn: &mut AsyncPgConnection,
    organization_id: Uuid,
    restock: &Reservations,
) -> Result<(), Tx> {
    for (product_id, quantity) in restock {
        let quantity = to_i32(*quantity, "quantity").map_err(row_error)?;
        return_stock(conn, organization_id, *product_id, quantity).await?;
    }
    Ok(())
}

async fn load_details(
    conn: &mut AsyncPgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderDetailRow>>, diesel::result::Error> {
    let rows: Vec<OrderDetailRow> = order_details::table
        .filter(order_details::order_id.eq_any(order_ids))
        .order_by((order_details::order_id, order_details::line_no))
        .select(OrderDetailRow::as_select())
        .load(conn)
        .await?;
    let mut grouped: HashMap<Uuid, Vec<OrderDetailRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

async fn load_assignments(
    conn: &mut AsyncPgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, AssignmentRow>, diesel::result::Error> {
    let rows: Vec<AssignmentRow> = order_assignments::table
        .filter(order_assignments::order_id.eq_any(order_ids))
        .select(AssignmentRow::as_select())
        .load(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.order_id, row)).collect())
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn list(
        &self,
        organization_id: &OrganizationId,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<Vec<Order>, OrderRepositoryError> {
        let (offset, limit) = page_window(page);
        let mut query = orders::table
            .filter(orders::organization_id.eq(*organization_id.as_uuid()))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(orders::client_id.eq(*client_id.as_uuid()));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OrderRow> = query
            .order_by((orders::created_at.desc(), orders::id.desc()))
            .offset(offset)
            .limit(limit)
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut details = load_details(&mut conn, &ids)
            .await
            .map_err(map_diesel_error)?;
        let mut assignments = load_assignments(&mut conn, &ids)
            .await
            .map_err(map_diesel_error)?;

        collect_rows(
            rows.into_iter().map(|row| {
                let lines = details.remove(&row.id).unwrap_or_default();
                let assignment = assignments.remove(&row.id);
                assemble(row, lines, assignment)
            }),
            OrderRepositoryError::query,
        )
    }

    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &OrderId,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrderRow> = orders::table
            .filter(orders::id.eq(id.as_uuid()))
            .filter(orders::organization_id.eq(organization_id.as_uuid()))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let ids = [row.id];
        let lines = load_details(&mut conn, &ids)
            .await
            .map_err(map_diesel_error)?
            .remove(&row.id)
            .unwrap_or_default();
        let assignment = load_assignments(&mut conn, &ids)
            .await
            .map_err(map_diesel_error)?
            .remove(&row.id);
        assemble(row, lines, assignment)
            .map(Some)
            .map_err(OrderRepositoryError::query)
    }

    async fn create(
        &self,
        order: &Order,
        reservations: &Reservations,
    ) -> Result<Vec<Product>, OrderRepositoryError> {
        let header = order_row(order);
        let lines = detail_rows(order).map_err(OrderRepositoryError::query)?;
        let reservations = reservations.clone();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let touched = conn
            .transaction::<_, Tx, _>(|conn| {
                async move {
                    let mut touched = Vec::with_capacity(reservations.len());
                    for (product_id, quantity) in &reservations {
                        let quantity = to_i32(*quantity, "quantity").map_err(row_error)?;
                        touched.push(
                            take_stock(conn, header.organization_id, *product_id, quantity).await?,
                        );
                    }
                    diesel::insert_into(orders::table)
                        .values(&header)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(order_details::table)
                        .values(&lines)
                        .execute(conn)
                        .await?;
                    Ok(touched)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;
        to_products(touched)
    }

    async fn replace(
        &self,
        order: &Order,
        stock_deltas: &BTreeMap<ProductId, i64>,
    ) -> Result<Vec<Product>, OrderRepositoryError> {
        let order_id = *order.id.as_uuid();
        let organization_id = *order.organization_id.as_uuid();
        let changes = OrderHeaderChanges {
            client_id: *order.client_id.as_uuid(),
            delivery_address: &order.delivery_address,
            notes: order.notes.as_deref(),
            total_cents: order.total.cents(),
            updated_at: order.updated_at,
        };
        let lines = detail_rows(order).map_err(OrderRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let touched = conn
            .transaction::<_, Tx, _>(|conn| {
                async move {
                    let updated = diesel::update(
                        orders::table
                            .filter(orders::id.eq(order_id))
                            .filter(orders::organization_id.eq(organization_id))
                            .filter(orders::status.eq(OrderStatus::Pending.as_str())),
                    )
                    .set(&changes)
                    .execute(conn)
                    .await?;
                    if updated == 0 {
                        return Err(TxError::Domain(OrderRepositoryError::status_changed()));
                    }

                    let mut touched = Vec::with_capacity(stock_deltas.len());
                    for (product_id, delta) in stock_deltas {
                        let amount = i32::try_from(delta.unsigned_abs())
                            .map_err(|_| row_error(format!("stock delta {delta} out of range")))?;
                        if *delta > 0 {
                            touched.push(
                                take_stock(conn, organization_id, *product_id, amount).await?,
                            );
                        } else if *delta < 0 {
                            touched.extend(
                                return_stock(conn, organization_id, *product_id, amount).await?,
                            );
                        }
                    }

                    diesel::delete(order_details::table.filter(order_details::order_id.eq(order_id)))
                        .execute(conn)
                        .await?;
                    diesel::insert_into(order_details::table)
                        .values(&lines)
                        .execute(conn)
                        .await?;
                    Ok(touched)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;
        to_products(touched)
    }

    async fn update_status(
        &self,
        order: &Order,
        expected: OrderStatus,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError> {
        let order_id = *order.id.as_uuid();
        let organization_id = *order.organization_id.as_uuid();
        let status = order.status;
        let updated_at = order.updated_at;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, Tx, _>(|conn| {
            async move {
                let updated = diesel::update(
                    orders::table
                        .filter(orders::id.eq(order_id))
                        .filter(orders::organization_id.eq(organization_id))
                        .filter(orders::status.eq(expected.as_str())),
                )
                .set((
                    orders::status.eq(status.as_str()),
                    orders::updated_at.eq(updated_at),
                ))
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Err(TxError::Domain(OrderRepositoryError::status_changed()));
                }
                restock_all(conn, organization_id, restock).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &OrderId,
        expected: OrderStatus,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError> {
        let order_id = *id.as_uuid();
        let organization_id = *organization_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, Tx, _>(|conn| {
            async move {
                let deleted = diesel::delete(
                    orders::table
                        .filter(orders::id.eq(order_id))
                        .filter(orders::organization_id.eq(organization_id))
                        .filter(orders::status.eq(expected.as_str())),
                )
                .execute(conn)
                .await?;
                if deleted == 0 {
                    return Err(TxError::Domain(OrderRepositoryError::status_changed()));
                }
                restock_all(conn, organization_id, restock).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn assign(&self, assignment: &OrderAssignment) -> Result<(), OrderRepositoryError> {
        let row = AssignmentRow::from(assignment);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(order_assignments::table)
            .values(&row)
            .on_conflict(order_assignments::order_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn unassign(&self, order_id: &OrderId) -> Result<bool, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            order_assignments::table.filter(order_assignments::order_id.eq(order_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_assignments(
        &self,
        organization_id: &OrganizationId,
        courier_id: Option<CourierId>,
    ) -> Result<Vec<OrderAssignment>, OrderRepositoryError> {
        let mut query = order_assignments::table
            .inner_join(orders::table)
            .filter(orders::organization_id.eq(*organization_id.as_uuid()))
            .select(AssignmentRow::as_select())
            .into_boxed();
        if let Some(courier_id) = courier_id {
            query = query.filter(order_assignments::courier_id.eq(*courier_id.as_uuid()));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AssignmentRow> = query
            .order_by((
                order_assignments::assigned_at.desc(),
                order_assignments::order_id.asc(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(OrderAssignment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Money, OrderDetail};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn header() -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            delivery_address: "1 Main St".into(),
            notes: None,
            status: "pending".into(),
            total_cents: 700,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(order_id: Uuid, line_no: i32, quantity: i32, unit: i64) -> OrderDetailRow {
        OrderDetailRow {
            order_id,
            line_no,
            product_id: Uuid::new_v4(),
            quantity,
            unit_price_cents: unit,
            subtotal_cents: i64::from(quantity) * unit,
        }
    }

    #[rstest]
    fn assemble_keeps_line_order_and_assignment(header: OrderRow) {
        let order_id = header.id;
        let courier = Uuid::new_v4();
        let order = assemble(
            header,
            vec![line(order_id, 0, 2, 250), line(order_id, 1, 1, 200)],
            Some(AssignmentRow {
                order_id,
                courier_id: courier,
                assigned_at: Utc::now(),
            }),
        )
        .expect("valid rows");

        assert_eq!(order.details.len(), 2);
        assert_eq!(order.details[0].quantity, 2);
        assert_eq!(order.total, Money::from_cents(700).expect("valid"));
        assert!(order.total_matches_details());
        assert_eq!(
            order.assignment.map(|a| a.courier_id),
            Some(CourierId::from_uuid(courier))
        );
    }

    #[rstest]
    fn assemble_rejects_unknown_statuses(mut header: OrderRow) {
        header.status = "lost".into();
        assert!(assemble(header, Vec::new(), None).is_err());
    }

    #[rstest]
    fn detail_rows_number_lines_from_zero(header: OrderRow) {
        let mut order = assemble(header, Vec::new(), None).expect("valid header");
        let detail = OrderDetail {
            product_id: ProductId::random(),
            quantity: 3,
            unit_price: Money::from_cents(100).expect("valid"),
            subtotal: Money::from_cents(300).expect("valid"),
        };
        order.details = vec![detail.clone(), detail];

        let rows = detail_rows(&order).expect("fits");
        assert_eq!(
            rows.iter().map(|row| row.line_no).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(rows.iter().all(|row| row.order_id == *order.id.as_uuid()));
    }

    #[rstest]
    fn stock_failures_survive_the_transaction() {
        let product_id = ProductId::random();
        let err = map_tx_error(TxError::Domain(OrderRepositoryError::insufficient_stock(
            product_id,
        )));
        assert_eq!(err, OrderRepositoryError::InsufficientStock { product_id });
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(repo_err, OrderRepositoryError::Connection { .. }));
    }
}
