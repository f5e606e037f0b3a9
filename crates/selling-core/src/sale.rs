//! # Sale Aggregate
//!
//! A sale owns its line items and keeps its total in step with them.
//!
//! ## Aggregate Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Sale                                       │
//! │   code, client, date_sold, status, total_price                          │
//! │                                                                         │
//! │   ┌───────────────────┐  ┌───────────────────┐  ┌───────────────────┐  │
//! │   │ LineItem          │  │ LineItem          │  │ LineItem          │  │
//! │   │ product: P001     │  │ product: P002     │  │ product: P003     │  │
//! │   │ quantity: 2       │  │ quantity: 1       │  │ quantity: 5       │  │
//! │   │ subtotal: 20.00   │  │ subtotal: 4.50    │  │ subtotal: 10.00   │  │
//! │   └───────────────────┘  └───────────────────┘  └───────────────────┘  │
//! │                                                                         │
//! │   total_price == Σ subtotal          (34.50)                            │
//! │   at most one line per product code                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutation Rules
//! - Every mutation recalculates `total_price` before returning
//! - A FINISHED sale rejects add, remove and clear
//! - CANCELLED does not block mutation; only FINISHED does

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Client, Product, SaleStatus};
use crate::validation::{validate_required, ValidationResult};

/// Message carried by the error raised when a finished sale is modified.
pub const FINISHED_SALE_MESSAGE: &str = "CANNOT MODIFY A FINISHED SALE";

// =============================================================================
// Line Item
// =============================================================================

/// One product line inside a sale.
///
/// `subtotal` tracks `quantity × product.price` as of each add/remove, so
/// the unit price is captured when the quantity changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: Option<i64>,
    product: Product,
    quantity: u32,
    subtotal: Money,
    /// Identity of the owning sale. A back-reference only, never ownership.
    sale_id: Option<i64>,
}

impl LineItem {
    /// Creates an empty line for a product (quantity 0, subtotal 0).
    pub fn new(product: Product) -> Self {
        Self {
            id: None,
            product,
            quantity: 0,
            subtotal: Money::zero(),
            sale_id: None,
        }
    }

    /// Rebuilds a line item from stored state.
    pub fn restore(
        id: Option<i64>,
        product: Product,
        quantity: u32,
        subtotal: Money,
        sale_id: Option<i64>,
    ) -> Self {
        Self {
            id,
            product,
            quantity,
            subtotal,
            sale_id,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Assigns the identity generated by storage.
    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Assigns the storage identity of the referenced product.
    ///
    /// Only the id changes; price and code stay as captured.
    pub fn set_product_id(&mut self, id: i64) {
        self.product.id = Some(id);
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn sale_id(&self) -> Option<i64> {
        self.sale_id
    }

    pub fn set_sale_id(&mut self, sale_id: i64) {
        self.sale_id = Some(sale_id);
    }

    /// Adds `quantity` units at the product's current price.
    ///
    /// ## Errors
    /// `Validation(OutOfRange)` if the quantity or the subtotal would
    /// overflow. The line is left untouched in that case.
    pub fn add(&mut self, quantity: u32) -> CoreResult<()> {
        let new_quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| out_of_range("quantity", i64::from(u32::MAX)))?;
        let new_subtotal = self
            .product
            .price
            .checked_multiply_quantity(quantity)
            .and_then(|added| self.subtotal.checked_add(added))
            .ok_or_else(|| out_of_range("subtotal", i64::MAX))?;

        self.quantity = new_quantity;
        self.subtotal = new_subtotal;
        Ok(())
    }

    /// Removes `quantity` units at the product's current price.
    ///
    /// ## Errors
    /// `RemoveExceedsQuantity` if `quantity` is larger than the line holds.
    /// The line is left untouched in that case.
    pub fn remove(&mut self, quantity: u32) -> CoreResult<()> {
        if quantity > self.quantity {
            return Err(CoreError::RemoveExceedsQuantity {
                existing: self.quantity,
                requested: quantity,
            });
        }

        let new_subtotal = self
            .product
            .price
            .checked_multiply_quantity(quantity)
            .and_then(|removed| self.subtotal.checked_sub(removed))
            .ok_or_else(|| out_of_range("subtotal", i64::MAX))?;

        self.quantity -= quantity;
        self.subtotal = new_subtotal;
        Ok(())
    }
}

fn out_of_range(field: &str, max: i64) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max,
    }
    .into()
}

// =============================================================================
// Sale
// =============================================================================

/// A sale: client, line items, running total and lifecycle status.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use selling_core::{Money, Product, Sale};
///
/// let product = Product {
///     code: "P001".to_string(),
///     name: "Pen".to_string(),
///     description: "Blue pen".to_string(),
///     price: Money::from_cents(1000),
///     ..Default::default()
/// };
///
/// let mut sale = Sale::new("S001", Utc::now());
/// sale.add_product(&product, 3).unwrap();
/// assert_eq!(sale.total_price(), Money::from_cents(3000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Generated identifier, `None` before registration.
    pub id: Option<i64>,

    /// Business identifier, unique across sales.
    pub code: String,

    /// Buyer. Storage requires one; the aggregate does not.
    pub client: Option<Client>,

    pub date_sold: DateTime<Utc>,

    /// Assigned directly by callers to move a sale through its lifecycle.
    pub status: SaleStatus,

    line_items: Vec<LineItem>,
    total_price: Money,
}

impl Sale {
    /// Creates an empty, STARTED sale.
    pub fn new(code: impl Into<String>, date_sold: DateTime<Utc>) -> Self {
        Self {
            id: None,
            code: code.into(),
            client: None,
            date_sold,
            status: SaleStatus::Started,
            line_items: Vec::new(),
            total_price: Money::zero(),
        }
    }

    /// Sets the buyer, builder style.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Rebuilds a sale from stored state.
    ///
    /// The total is recomputed from the line items rather than trusted.
    pub fn restore(
        id: Option<i64>,
        code: String,
        client: Option<Client>,
        date_sold: DateTime<Utc>,
        status: SaleStatus,
        line_items: Vec<LineItem>,
    ) -> Self {
        let mut sale = Self {
            id,
            code,
            client,
            date_sold,
            status,
            line_items,
            total_price: Money::zero(),
        };
        sale.recalculate_total_price();
        sale
    }

    /// Checks the fields a sale must carry before it is stored, along
    /// with the client and every line-item product stored with it.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("code", &self.code)?;
        if let Some(client) = &self.client {
            client.validate()?;
        }
        for item in &self.line_items {
            item.product.validate()?;
        }
        Ok(())
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Mutable access for persistence layers assigning identities.
    ///
    /// Quantity changes belong to [`add_product`](Self::add_product) and
    /// [`remove_product`](Self::remove_product), which keep the total current.
    pub fn line_items_mut(&mut self) -> &mut [LineItem] {
        &mut self.line_items
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Sum of quantities across all line items.
    pub fn total_product_quantity(&self) -> u64 {
        self.line_items
            .iter()
            .map(|item| u64::from(item.quantity()))
            .sum()
    }

    /// Adds `quantity` units of `product`.
    ///
    /// Merges into the existing line when one already holds the same
    /// product code; otherwise a new line is appended.
    ///
    /// ## Errors
    /// - `UnsupportedOperation` if the sale is FINISHED.
    /// - `Validation(OutOfRange)` if the line quantity, the subtotal or the
    ///   total would overflow. The sale is left unchanged.
    pub fn add_product(&mut self, product: &Product, quantity: u32) -> CoreResult<()> {
        self.ensure_modifiable()?;

        let position = self.position_of(&product.code);
        let mut item = match position {
            Some(index) => self.line_items[index].clone(),
            None => {
                let mut item = LineItem::new(product.clone());
                item.sale_id = self.id;
                item
            }
        };
        item.add(quantity)?;

        let total = self
            .line_items
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != position)
            .try_fold(item.subtotal(), |total, (_, other)| total.checked_add(other.subtotal()))
            .ok_or_else(|| out_of_range("total_price", i64::MAX))?;

        match position {
            Some(index) => self.line_items[index] = item,
            None => self.line_items.push(item),
        }
        self.total_price = total;
        Ok(())
    }

    /// Removes up to `quantity` units of `product`.
    ///
    /// When the line holds more than `quantity` it is decremented; otherwise
    /// the whole line is dropped. A product with no line is a no-op.
    ///
    /// ## Errors
    /// `UnsupportedOperation` if the sale is FINISHED.
    pub fn remove_product(&mut self, product: &Product, quantity: u32) -> CoreResult<()> {
        self.ensure_modifiable()?;

        if let Some(index) = self.position_of(&product.code) {
            let item = &mut self.line_items[index];
            if item.quantity() > quantity {
                item.remove(quantity)?;
            } else {
                self.line_items.remove(index);
            }
        }

        self.recalculate_total_price();
        Ok(())
    }

    /// Drops every line item and zeroes the total.
    ///
    /// ## Errors
    /// `UnsupportedOperation` if the sale is FINISHED.
    pub fn remove_all_products(&mut self) -> CoreResult<()> {
        self.ensure_modifiable()?;

        self.line_items.clear();
        self.total_price = Money::zero();
        Ok(())
    }

    /// Recomputes `total_price` as the sum of line subtotals.
    ///
    /// Clamps at the bounds of `Money` rather than overflowing.
    pub fn recalculate_total_price(&mut self) {
        self.total_price = self
            .line_items
            .iter()
            .fold(Money::zero(), |total, item| total.saturating_add(item.subtotal()));
    }

    fn ensure_modifiable(&self) -> CoreResult<()> {
        if self.status == SaleStatus::Finished {
            return Err(CoreError::unsupported(FINISHED_SALE_MESSAGE));
        }
        Ok(())
    }

    fn position_of(&self, code: &str) -> Option<usize> {
        self.line_items
            .iter()
            .position(|item| item.product().code == code)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
