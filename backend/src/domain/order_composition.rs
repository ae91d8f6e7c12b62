//! Order composition: turns a submitted draft into priced detail lines.
//!
//! Composition is pure. Callers load the catalog rows referenced by the
//! draft, and on update the quantities the order already holds, then hand
//! them to [`OrderComposer`]. Checks run in a fixed order and stop at the
//! first failure:
//!
//! 1. draft shape ([`check_draft`]);
//! 2. client ownership (done by the caller between the two steps);
//! 3. every product exists in the caller's catalog and is active;
//! 4. stock covers the requested quantity, summed per product;
//! 5. the submitted total, when present, is within one cent of the computed
//!    total.
//!
//! The computed total is what gets stored.

use std::collections::{BTreeMap, HashMap};

use serde_json::json;

use super::{
    ClientId, Error, ErrorCode, Money, OrderDetail, OrderDraft, Product, ProductId,
    TOTAL_TOLERANCE_CENTS, optional_text, required_text,
};

/// Maximum number of lines in one order.
pub const MAX_ORDER_LINES: usize = 200;
/// Maximum length of a delivery address.
pub const DELIVERY_ADDRESS_MAX: usize = 500;
/// Maximum length of order notes.
pub const ORDER_NOTES_MAX: usize = 1000;

/// Stock held per product.
pub type Reservations = BTreeMap<ProductId, u32>;

/// Line with a product and a positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Draft whose shape has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedDraft {
    pub client_id: ClientId,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub lines: Vec<CheckedLine>,
    pub submitted_total: Option<Money>,
}

impl CheckedDraft {
    /// Distinct product ids in line order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut seen = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !seen.contains(&line.product_id) {
                seen.push(line.product_id);
            }
        }
        seen
    }
}

/// Result of a successful composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedOrder {
    pub client_id: ClientId,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub details: Vec<OrderDetail>,
    pub reservations: Reservations,
    pub total: Money,
}

impl ComposedOrder {
    /// Per-product stock movement needed to go from `previous` to this
    /// order's reservations. Positive values take stock, negative values
    /// return it. Products whose reservation is unchanged are omitted.
    pub fn stock_deltas(&self, previous: &Reservations) -> BTreeMap<ProductId, i64> {
        let mut deltas = BTreeMap::new();
        for (product_id, quantity) in &self.reservations {
            deltas.insert(*product_id, i64::from(*quantity));
        }
        for (product_id, quantity) in previous {
            *deltas.entry(*product_id).or_insert(0) -= i64::from(*quantity);
        }
        deltas.retain(|_, delta| *delta != 0);
        deltas
    }
}

/// Validate the shape of a submitted draft.
///
/// Missing fields are reported together under `MISSING_FIELDS`; the first
/// line with a quantity below one is reported under `INVALID_QUANTITY`.
pub fn check_draft(draft: OrderDraft) -> Result<CheckedDraft, Error> {
    let mut missing = Vec::new();
    if draft.client_id.is_none() {
        missing.push("clientId".to_owned());
    }
    if draft
        .delivery_address
        .as_deref()
        .is_none_or(|address| address.trim().is_empty())
    {
        missing.push("deliveryAddress".to_owned());
    }
    if draft.details.is_empty() {
        missing.push("details".to_owned());
    }
    for (index, line) in draft.details.iter().enumerate() {
        if line.product_id.is_none() {
            missing.push(format!("details[{index}].productId"));
        }
        if line.quantity.is_none() {
            missing.push(format!("details[{index}].quantity"));
        }
    }
    let (Some(client_id), Some(delivery_address), true) =
        (draft.client_id, draft.delivery_address.as_deref(), missing.is_empty())
    else {
        return Err(
            Error::new(ErrorCode::MissingFields, "missing required fields")
                .with_details(json!({ "fields": missing })),
        );
    };

    let delivery_address = required_text("deliveryAddress", delivery_address, DELIVERY_ADDRESS_MAX)?;
    let notes = optional_text("notes", draft.notes.as_deref(), ORDER_NOTES_MAX)?;
    if draft.details.len() > MAX_ORDER_LINES {
        return Err(
            Error::invalid_request(format!("an order may have at most {MAX_ORDER_LINES} lines"))
                .with_details(json!({
                    "field": "details",
                    "code": "too_many_lines",
                    "max": MAX_ORDER_LINES,
                })),
        );
    }

    let mut lines = Vec::with_capacity(draft.details.len());
    for (index, line) in draft.details.into_iter().enumerate() {
        let (Some(product_id), Some(raw_quantity)) = (line.product_id, line.quantity) else {
            continue;
        };
        let quantity = u32::try_from(raw_quantity)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or_else(|| invalid_quantity(index, raw_quantity))?;
        lines.push(CheckedLine {
            product_id,
            quantity,
        });
    }

    Ok(CheckedDraft {
        client_id,
        delivery_address,
        notes,
        lines,
        submitted_total: draft.total,
    })
}

fn invalid_quantity(index: usize, quantity: i64) -> Error {
    Error::new(
        ErrorCode::InvalidQuantity,
        "quantity must be a positive whole number",
    )
    .with_details(json!({ "index": index, "quantity": quantity }))
}

/// Prices a checked draft against a catalog snapshot.
///
/// # Examples
/// ```
/// use backoffice::domain::{
///     CheckedDraft, CheckedLine, ClientId, Money, OrderComposer, OrganizationId, Product,
///     ProductId, Reservations,
/// };
///
/// let product = Product {
///     id: ProductId::random(),
///     organization_id: OrganizationId::random(),
///     category_id: None,
///     name: "Cola".into(),
///     description: None,
///     price: Money::from_cents(150).unwrap(),
///     stock: 10,
///     active: true,
/// };
/// let draft = CheckedDraft {
///     client_id: ClientId::random(),
///     delivery_address: "1 Main St".into(),
///     notes: None,
///     lines: vec![CheckedLine { product_id: product.id, quantity: 4 }],
///     submitted_total: None,
/// };
/// let reserved = Reservations::new();
/// let catalog = [product];
/// let composed = OrderComposer::new(&catalog, &reserved).compose(draft).unwrap();
/// assert_eq!(composed.total.cents(), 600);
/// ```
#[derive(Debug)]
pub struct OrderComposer<'a> {
    catalog: HashMap<ProductId, &'a Product>,
    already_reserved: &'a Reservations,
}

impl<'a> OrderComposer<'a> {
    /// Build a composer over `catalog`, crediting `already_reserved` back to
    /// the available stock.
    pub fn new(catalog: &'a [Product], already_reserved: &'a Reservations) -> Self {
        Self {
            catalog: catalog.iter().map(|product| (product.id, product)).collect(),
            already_reserved,
        }
    }

    /// Run the catalog, stock and total checks and price every line.
    pub fn compose(&self, draft: CheckedDraft) -> Result<ComposedOrder, Error> {
        let products = self.resolve_products(&draft)?;
        let reservations = self.reserve_stock(&draft, &products)?;
        let (details, total) = price_lines(&draft.lines, &products)?;

        let mismatch = draft
            .submitted_total
            .filter(|submitted| submitted.abs_diff_cents(total) > TOTAL_TOLERANCE_CENTS);
        if let Some(submitted) = mismatch {
            return Err(Error::new(
                ErrorCode::TotalMismatch,
                "submitted total does not match the order details",
            )
            .with_details(json!({
                "submitted": submitted.as_decimal(),
                "computed": total.as_decimal(),
            })));
        }

        Ok(ComposedOrder {
            client_id: draft.client_id,
            delivery_address: draft.delivery_address,
            notes: draft.notes,
            details,
            reservations,
            total,
        })
    }

    fn resolve_products(
        &self,
        draft: &CheckedDraft,
    ) -> Result<HashMap<ProductId, &'a Product>, Error> {
        let ids = draft.product_ids();
        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| !self.catalog.contains_key(id))
            .map(ToString::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::new(ErrorCode::ProductNotFound, "product not found")
                .with_details(json!({ "productIds": unknown })));
        }

        let mut products = HashMap::with_capacity(ids.len());
        for id in ids {
            let Some(product) = self.catalog.get(&id).copied() else {
                continue;
            };
            if !product.active {
                return Err(Error::new(
                    ErrorCode::ProductInactive,
                    format!("product {} is not available for sale", product.name),
                )
                .with_details(json!({ "productId": id })));
            }
            products.insert(id, product);
        }
        Ok(products)
    }

    fn reserve_stock(
        &self,
        draft: &CheckedDraft,
        products: &HashMap<ProductId, &'a Product>,
    ) -> Result<Reservations, Error> {
        let mut requested: BTreeMap<ProductId, u64> = BTreeMap::new();
        for line in &draft.lines {
            *requested.entry(line.product_id).or_insert(0) += u64::from(line.quantity);
        }

        let mut reservations = Reservations::new();
        for id in draft.product_ids() {
            let (Some(product), Some(&wanted)) = (products.get(&id), requested.get(&id)) else {
                continue;
            };
            let held = self.already_reserved.get(&id).copied().unwrap_or(0);
            let available = u64::from(product.stock) + u64::from(held);
            let quantity = u32::try_from(wanted).ok().filter(|_| wanted <= available);
            let Some(quantity) = quantity else {
                return Err(Error::new(
                    ErrorCode::InsufficientStock,
                    format!("insufficient stock for {}", product.name),
                )
                .with_details(json!({
                    "productId": id,
                    "requested": wanted,
                    "available": available,
                })));
            };
            reservations.insert(id, quantity);
        }
        Ok(reservations)
    }
}

fn price_lines(
    lines: &[CheckedLine],
    products: &HashMap<ProductId, &Product>,
) -> Result<(Vec<OrderDetail>, Money), Error> {
    let too_large = |_| Error::invalid_request("order total is too large");
    let mut total = Money::ZERO;
    let mut details = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(product) = products.get(&line.product_id) else {
            continue;
        };
        let subtotal = product.price.checked_mul(line.quantity).map_err(too_large)?;
        total = total.checked_add(subtotal).map_err(too_large)?;
        details.push(OrderDetail {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: product.price,
            subtotal,
        });
    }
    Ok((details, total))
}
