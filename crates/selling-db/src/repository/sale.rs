//! # Sale Repository
//!
//! Storage for the sale aggregate and its line items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. REGISTER                                                           │
//! │     └── register(sale)                                                 │
//! │         ├── merge client                    ┐                          │
//! │         ├── merge every line-item product   │ one scope,               │
//! │         ├── insert tb_sale row              │ one transaction          │
//! │         └── insert tb_line_item rows        ┘                          │
//! │                                                                         │
//! │  2. MUTATE IN MEMORY                                                   │
//! │     └── sale.add_product / remove_product  (aggregate rules)          │
//! │     └── update(sale)  → line items mirror the aggregate               │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── sale.status = Finished;  finalize_sale(&sale)                  │
//! │     └── sale.status = Cancelled; cancel_sale(&sale)                    │
//! │                                                                         │
//! │  ✗ delete(sale)  → always UnsupportedOperation                         │
//! │  ✓ SaleAdminRepository::purge(&sale)  (administrative cleanup only)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use selling_core::validation::ValidationResult;
use selling_core::{Address, Client, LineItem, Money, Product, Sale, SaleStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;
use uuid::Uuid;

use super::generic::{insert_row, merge_row, select_by_id, GenericRepository};
use super::{Persistable, Repository, SqliteQuery};
use crate::config::{BackendConfig, BackendId};
use crate::error::{DbError, DbResult, FIND_FAILED, REGISTER_SALE_FAILED};
use crate::scope::ResourceScope;

/// Message of the error returned by [`SaleRepository::delete`].
pub const DELETE_NOT_ALLOWED: &str = "Operation not allowed";

// =============================================================================
// Line Item Mapping
// =============================================================================

#[async_trait]
impl Persistable for LineItem {
    const ENTITY: &'static str = "line item";
    const TABLE: &'static str = "tb_line_item";
    const COLUMNS: &'static [&'static str] = &["product_id", "quantity", "subtotal_cents", "sale_id"];

    fn id(&self) -> Option<i64> {
        LineItem::id(self)
    }

    fn set_id(&mut self, id: i64) {
        LineItem::set_id(self, id);
    }

    fn validate(&self) -> ValidationResult<()> {
        self.product().validate()
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.product().id)
            .bind(self.quantity())
            .bind(self.subtotal())
            .bind(self.sale_id())
    }

    /// Decodes the line with a product holding only its id; `load_owned`
    /// fills in the rest.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let product = Product {
            id: row.try_get("product_id")?,
            ..Product::default()
        };

        Ok(LineItem::restore(
            Some(row.try_get("id")?),
            product,
            row.try_get("quantity")?,
            row.try_get("subtotal_cents")?,
            row.try_get("sale_id")?,
        ))
    }

    async fn load_owned(&mut self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let Some(product_id) = self.product().id else {
            return Ok(());
        };

        if let Some(product) = select_by_id::<Product>(conn, product_id).await? {
            *self = LineItem::restore(
                self.id(),
                product,
                self.quantity(),
                self.subtotal(),
                self.sale_id(),
            );
        }
        Ok(())
    }
}

// =============================================================================
// Sale Mapping
// =============================================================================

#[async_trait]
impl Persistable for Sale {
    const ENTITY: &'static str = "sale";
    const TABLE: &'static str = "tb_sale";
    const COLUMNS: &'static [&'static str] =
        &["code", "client_id", "total_price_cents", "date_sold", "status"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn validate(&self) -> ValidationResult<()> {
        Sale::validate(self)
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.code.clone())
            .bind(self.client.as_ref().and_then(|client| client.id))
            .bind(self.total_price())
            .bind(self.date_sold)
            .bind(self.status)
    }

    /// Decodes the sale row with a client holding only its id; `load_owned`
    /// fills in the client and the line items.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let client_id: Option<i64> = row.try_get("client_id")?;

        Ok(Sale::restore(
            Some(row.try_get("id")?),
            row.try_get("code")?,
            client_id.map(|id| Client {
                id: Some(id),
                ..Client::default()
            }),
            row.try_get("date_sold")?,
            row.try_get("status")?,
            Vec::new(),
        ))
    }

    /// Writes every line item with this sale as back-reference, inserting
    /// products that were never stored, then deletes stored lines the
    /// aggregate no longer holds.
    async fn persist_owned(&mut self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let Some(sale_id) = self.id else {
            return Ok(());
        };

        for item in self.line_items_mut() {
            if item.product().id.is_none() {
                let mut product = item.product().clone();
                insert_row(conn, &mut product).await?;
                if let Some(product_id) = product.id {
                    item.set_product_id(product_id);
                }
            }

            item.set_sale_id(sale_id);
            merge_row(conn, item).await?;
        }

        let kept: Vec<i64> = self.line_items().iter().filter_map(LineItem::id).collect();
        let sql = if kept.is_empty() {
            "DELETE FROM tb_line_item WHERE sale_id = ?".to_string()
        } else {
            format!(
                "DELETE FROM tb_line_item WHERE sale_id = ? AND id NOT IN ({})",
                vec!["?"; kept.len()].join(", ")
            )
        };

        let mut query = sqlx::query(&sql).bind(sale_id);
        for id in kept {
            query = query.bind(id);
        }
        let removed = query.execute(&mut *conn).await?.rows_affected();

        debug!(sale_id = %sale_id, lines = self.line_items().len(), removed, "Line items written");
        Ok(())
    }

    async fn load_owned(&mut self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let Some(sale_id) = self.id else {
            return Ok(());
        };

        let client = match self.client.as_ref().and_then(|client| client.id) {
            Some(client_id) => select_by_id::<Client>(conn, client_id).await?,
            None => None,
        };

        let sql = format!(
            "SELECT id, {} FROM tb_line_item WHERE sale_id = ? ORDER BY id",
            LineItem::COLUMNS.join(", ")
        );
        let rows = sqlx::query(&sql).bind(sale_id).fetch_all(&mut *conn).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut item = LineItem::from_row(row)?;
            item.load_owned(conn).await?;
            items.push(item);
        }

        *self = Sale::restore(
            self.id,
            std::mem::take(&mut self.code),
            client,
            self.date_sold,
            self.status,
            items,
        );
        Ok(())
    }

    async fn remove_owned(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tb_line_item WHERE sale_id = ?")
            .bind(self.id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Sale Repository
// =============================================================================

/// Sale-specific operations on top of the repository contract.
#[async_trait]
pub trait SaleOperations: Repository<Sale, i64> {
    /// Stores a sale whose status the caller already set to FINISHED.
    async fn finalize_sale(&self, sale: &Sale) -> DbResult<()>;

    /// Stores a sale whose status the caller already set to CANCELLED.
    async fn cancel_sale(&self, sale: &Sale) -> DbResult<()>;

    /// Loads a sale with its client, line items and products in a single
    /// query. Absence is `Ok(None)`.
    async fn find_with_collections(&self, id: i64) -> DbResult<Option<Sale>>;
}

/// Repository for sales on one backend.
///
/// ## Usage
/// ```rust,ignore
/// let sales = db.sales(BackendId::Primary);
///
/// let mut sale = sales.register(sale).await?;
/// sale.status = SaleStatus::Finished;
/// sales.finalize_sale(&sale).await?;
///
/// let full = sales.find_with_collections(sale.id.unwrap()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    inner: GenericRepository<Sale>,
}

impl SaleRepository {
    /// Creates a repository bound to `config`.
    pub fn new(config: BackendConfig) -> Self {
        SaleRepository {
            inner: GenericRepository::new(config),
        }
    }

    pub fn backend(&self) -> BackendId {
        self.inner.backend()
    }
}

/// Merges the client and every line-item product, then inserts the sale
/// and its line items.
async fn register_graph(conn: &mut SqliteConnection, sale: &mut Sale) -> Result<(), sqlx::Error> {
    if let Some(client) = sale.client.as_mut() {
        merge_row(conn, client).await?;
    }

    for item in sale.line_items_mut() {
        let mut product = item.product().clone();
        merge_row(conn, &mut product).await?;
        if let Some(product_id) = product.id {
            item.set_product_id(product_id);
        }
    }

    insert_row(conn, sale).await
}

#[async_trait]
impl Repository<Sale, i64> for SaleRepository {
    async fn register(&self, mut sale: Sale) -> DbResult<Sale> {
        sale.validate()?;

        debug!(
            code = %sale.code,
            lines = sale.line_items().len(),
            backend = %self.inner.backend(),
            "Registering sale"
        );

        let mut scope = ResourceScope::open(self.inner.config()).await?;
        let outcome = register_graph(scope.connection(), &mut sale).await;
        scope.finish(outcome, REGISTER_SALE_FAILED).await?;

        debug!(id = ?sale.id, code = %sale.code, "Sale registered");
        Ok(sale)
    }

    async fn update(&self, sale: Sale) -> DbResult<Sale> {
        self.inner.update(sale).await
    }

    /// Sales are never deleted through the repository contract.
    async fn delete(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = ?sale.id, code = %sale.code, "Refusing to delete sale");
        Err(DbError::unsupported(DELETE_NOT_ALLOWED))
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> DbResult<Vec<Sale>> {
        self.inner.find_all().await
    }
}

#[async_trait]
impl SaleOperations for SaleRepository {
    async fn finalize_sale(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = ?sale.id, status = %sale.status, "Finalizing sale");
        self.update(sale.clone()).await.map(|_| ())
    }

    async fn cancel_sale(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = ?sale.id, status = %sale.status, "Cancelling sale");
        self.update(sale.clone()).await.map(|_| ())
    }

    async fn find_with_collections(&self, id: i64) -> DbResult<Option<Sale>> {
        selling_core::validation::validate_id(id)?;

        debug!(id = %id, backend = %self.inner.backend(), "Fetching sale with collections");

        let mut scope = ResourceScope::open(self.inner.config()).await?;
        let outcome = select_graph(scope.connection(), id).await;
        scope.finish(outcome, FIND_FAILED).await
    }
}

/// Sale, client, line items and products in one round trip.
///
/// LEFT JOIN on the line items so a sale without lines is still found.
const SELECT_GRAPH_SQL: &str = r#"
    SELECT
        s.id              AS sale_id,
        s.code            AS sale_code,
        s.date_sold       AS date_sold,
        s.status          AS status,
        c.id              AS client_id,
        c.name            AS client_name,
        c.tax_id          AS tax_id,
        c.phone           AS phone,
        c.address         AS address,
        c.address_number  AS address_number,
        c.city            AS city,
        c.state           AS state,
        li.id             AS item_id,
        li.quantity       AS quantity,
        li.subtotal_cents AS subtotal_cents,
        p.id              AS product_id,
        p.code            AS product_code,
        p.name            AS product_name,
        p.description     AS description,
        p.price_cents     AS price_cents
    FROM tb_sale s
    INNER JOIN tb_client c ON c.id = s.client_id
    LEFT JOIN tb_line_item li ON li.sale_id = s.id
    LEFT JOIN tb_product p ON p.id = li.product_id
    WHERE s.id = ?1
    ORDER BY li.id
"#;

async fn select_graph(conn: &mut SqliteConnection, id: i64) -> Result<Option<Sale>, sqlx::Error> {
    let rows = sqlx::query(SELECT_GRAPH_SQL).bind(id).fetch_all(&mut *conn).await?;

    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let client = Client {
        id: Some(first.try_get("client_id")?),
        name: first.try_get("client_name")?,
        tax_id: first.try_get("tax_id")?,
        phone: first.try_get("phone")?,
        address: Address {
            street: first.try_get("address")?,
            number: first.try_get("address_number")?,
            city: first.try_get("city")?,
            state: first.try_get("state")?,
        },
    };

    let mut items = Vec::new();
    for row in &rows {
        let item_id: Option<i64> = row.try_get("item_id")?;
        let Some(item_id) = item_id else {
            continue;
        };

        let product = Product {
            id: row.try_get("product_id")?,
            code: row.try_get("product_code")?,
            name: row.try_get("product_name")?,
            description: row.try_get("description")?,
            price: row.try_get::<Money, _>("price_cents")?,
        };

        items.push(LineItem::restore(
            Some(item_id),
            product,
            row.try_get("quantity")?,
            row.try_get("subtotal_cents")?,
            Some(id),
        ));
    }

    let date_sold: DateTime<Utc> = first.try_get("date_sold")?;
    let status: SaleStatus = first.try_get("status")?;

    Ok(Some(Sale::restore(
        Some(first.try_get("sale_id")?),
        first.try_get("sale_code")?,
        Some(client),
        date_sold,
        status,
        items,
    )))
}

// =============================================================================
// Administrative Removal
// =============================================================================

/// Administrative capability to remove stored sales.
///
/// Separate from [`SaleRepository`] so the ordinary contract never
/// exposes deletion. Intended for cleanup tooling and test teardown.
#[derive(Debug, Clone)]
pub struct SaleAdminRepository {
    inner: GenericRepository<Sale>,
}

impl SaleAdminRepository {
    pub fn new(config: BackendConfig) -> Self {
        SaleAdminRepository {
            inner: GenericRepository::new(config),
        }
    }

    /// Removes a sale and its line items in one scope.
    ///
    /// The client and products stay stored.
    pub async fn purge(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = ?sale.id, code = %sale.code, "Purging sale");
        self.inner.delete(sale).await
    }
}

/// Generates a unique sale code.
///
/// ## Format
/// `S-` followed by 32 hex digits of a v4 UUID.
pub fn generate_sale_code() -> String {
    format!("S-{}", Uuid::new_v4().simple())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ClientRepository, ProductRepository};
    use crate::testing::{client, count_rows, prepared_backends, product, sold_at};
    use selling_core::FINISHED_SALE_MESSAGE;
    use tempfile::TempDir;

    fn sale_with_items(code: &str, tax_id: &str) -> Sale {
        let mut sale = Sale::new(code, sold_at()).with_client(client(tax_id));
        sale.add_product(&product("P1", 1000), 2).unwrap();
        sale.add_product(&product("P2", 500), 1).unwrap();
        sale
    }

    #[tokio::test]
    async fn test_register_cascades_client_and_products() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let registered = sales.register(sale_with_items("S001", "10000000001")).await.unwrap();

        assert!(registered.id.is_some());
        assert!(registered.client.as_ref().unwrap().id.is_some());
        for item in registered.line_items() {
            assert!(item.id().is_some());
            assert!(item.product().id.is_some());
            assert_eq!(item.sale_id(), registered.id);
        }

        let found = sales.find_by_id(registered.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found, registered);
        assert_eq!(found.total_price(), Money::from_cents(2500));
        assert_eq!(found.status, SaleStatus::Started);

        let clients = ClientRepository::new(backends.primary.clone());
        let products = ProductRepository::new(backends.primary.clone());
        assert_eq!(clients.find_all().await.unwrap().len(), 1);
        assert_eq!(products.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_register_reuses_stored_client_and_product() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let clients = ClientRepository::new(backends.primary.clone());
        let products = ProductRepository::new(backends.primary.clone());
        let sales = SaleRepository::new(backends.primary.clone());

        let stored_client = clients.register(client("10000000002")).await.unwrap();
        let stored_product = products.register(product("P9", 300)).await.unwrap();

        let mut sale = Sale::new("S002", sold_at()).with_client(stored_client.clone());
        sale.add_product(&stored_product, 3).unwrap();
        let registered = sales.register(sale).await.unwrap();

        assert_eq!(registered.client.as_ref().unwrap().id, stored_client.id);
        assert_eq!(registered.line_items()[0].product().id, stored_product.id);
        assert_eq!(products.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_without_client_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let mut sale = Sale::new("S003", sold_at());
        sale.add_product(&product("P1", 1000), 1).unwrap();

        let err = sales.register(sale).await.unwrap_err();
        assert!(matches!(err, DbError::Storage { .. }));
        assert_eq!(err.to_string(), "Error saving sale");

        // the whole cascade was rolled back
        assert_eq!(count_rows(&backends.primary, "tb_sale").await, 0);
        assert_eq!(count_rows(&backends.primary, "tb_product").await, 0);
    }

    #[tokio::test]
    async fn test_register_invalid_sale_is_parameter_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let sale = Sale::new("", sold_at()).with_client(client("10000000004"));
        assert!(matches!(sales.register(sale).await, Err(DbError::Parameter(_))));
        assert!(matches!(sales.find_by_id(0).await, Err(DbError::Parameter(_))));
    }

    #[tokio::test]
    async fn test_register_checks_cascaded_entities_first() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let mut sale = Sale::new("S018", sold_at()).with_client(client("10000000018"));
        sale.add_product(&product("CODE-TOO-LONG", 100), 1).unwrap();
        assert!(matches!(sales.register(sale).await, Err(DbError::Parameter(_))));

        let mut nameless = client("10000000019");
        nameless.name = String::new();
        let sale = Sale::new("S019", sold_at()).with_client(nameless);
        assert!(matches!(sales.register(sale).await, Err(DbError::Parameter(_))));

        assert_eq!(count_rows(&backends.primary, "tb_client").await, 0);
        assert_eq!(count_rows(&backends.primary, "tb_product").await, 0);
        assert_eq!(count_rows(&backends.primary, "tb_sale").await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_sale_code_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        sales.register(sale_with_items("S005", "10000000005")).await.unwrap();

        let duplicate = Sale::new("S005", sold_at()).with_client(client("10000000006"));
        let err = sales.register(duplicate).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(sales.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_finalize_and_cancel() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let mut finished = sales.register(sale_with_items("S006", "10000000007")).await.unwrap();
        finished.status = SaleStatus::Finished;
        sales.finalize_sale(&finished).await.unwrap();

        let mut stored = sales.find_by_id(finished.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Finished);
        let err = stored.add_product(&product("P3", 100), 1).unwrap_err();
        assert_eq!(err.to_string(), FINISHED_SALE_MESSAGE);

        let mut cancelled = Sale::new("S007", sold_at()).with_client(client("10000000008"));
        cancelled = sales.register(cancelled).await.unwrap();
        cancelled.status = SaleStatus::Cancelled;
        sales.cancel_sale(&cancelled).await.unwrap();

        let stored = sales.find_by_id(cancelled.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_mirrors_line_items() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let mut sale = sales.register(sale_with_items("S008", "10000000009")).await.unwrap();
        assert_eq!(count_rows(&backends.primary, "tb_line_item").await, 2);

        sale.remove_product(&product("P1", 1000), 2).unwrap();
        sale.add_product(&product("P2", 500), 2).unwrap();
        sale.add_product(&product("P4", 250), 4).unwrap();
        let updated = sales.update(sale).await.unwrap();

        let stored = sales.find_by_id(updated.id.unwrap()).await.unwrap().unwrap();
        let lines: Vec<_> = stored
            .line_items()
            .iter()
            .map(|item| (item.product().code.clone(), item.quantity()))
            .collect();
        assert_eq!(lines, vec![("P2".to_string(), 3), ("P4".to_string(), 4)]);
        assert_eq!(stored.total_price(), Money::from_cents(2500));
        assert_eq!(count_rows(&backends.primary, "tb_line_item").await, 2);
    }

    #[tokio::test]
    async fn test_delete_is_always_refused() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let registered = sales.register(sale_with_items("S009", "10000000010")).await.unwrap();

        let err = sales.delete(&registered).await.unwrap_err();
        assert!(matches!(err, DbError::UnsupportedOperation(ref m) if m == DELETE_NOT_ALLOWED));

        let mut finished = registered.clone();
        finished.status = SaleStatus::Finished;
        assert!(matches!(sales.delete(&finished).await, Err(DbError::UnsupportedOperation(_))));

        let unsaved = Sale::new("S010", sold_at());
        assert!(matches!(sales.delete(&unsaved).await, Err(DbError::UnsupportedOperation(_))));

        assert!(sales.find_by_id(registered.id.unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_with_collections() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let registered = sales.register(sale_with_items("S011", "10000000011")).await.unwrap();
        let id = registered.id.unwrap();

        let eager = sales.find_with_collections(id).await.unwrap().expect("sale found");
        assert_eq!(eager, registered);
        assert_eq!(eager, sales.find_by_id(id).await.unwrap().unwrap());
        assert_eq!(eager.client.as_ref().unwrap().tax_id, "10000000011");
        assert_eq!(eager.total_product_quantity(), 3);

        assert!(sales.find_with_collections(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_with_collections_on_emptied_sale() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());

        let mut sale = sales.register(sale_with_items("S012", "10000000012")).await.unwrap();
        sale.remove_all_products().unwrap();
        let sale = sales.update(sale).await.unwrap();

        let eager = sales
            .find_with_collections(sale.id.unwrap())
            .await
            .unwrap()
            .expect("emptied sale still found");
        assert!(eager.line_items().is_empty());
        assert!(eager.total_price().is_zero());
    }

    #[tokio::test]
    async fn test_example_scenario_persists_each_step() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.tertiary.clone());
        let ten = product("P10", 1000);

        let mut sale = Sale::new("S013", sold_at()).with_client(client("10000000013"));
        sale.add_product(&ten, 3).unwrap();
        let mut sale = sales.register(sale).await.unwrap();
        assert_eq!(sale.total_price(), Money::from_cents(3000));

        sale.remove_product(&ten, 2).unwrap();
        let mut sale = sales.update(sale).await.unwrap();
        let stored = sales.find_by_id(sale.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.line_items()[0].quantity(), 1);
        assert_eq!(stored.line_items()[0].subtotal(), Money::from_cents(1000));
        assert_eq!(stored.total_price(), Money::from_cents(1000));

        sale.remove_product(&ten, 1).unwrap();
        let sale = sales.update(sale).await.unwrap();
        let stored = sales.find_by_id(sale.id.unwrap()).await.unwrap().unwrap();
        assert!(stored.line_items().is_empty());
        assert_eq!(stored.total_price().to_string(), "0.00");
    }

    #[tokio::test]
    async fn test_admin_purge() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.primary.clone());
        let admin = SaleAdminRepository::new(backends.primary.clone());

        let keep = sales.register(sale_with_items("S014", "10000000014")).await.unwrap();
        let mut purge = Sale::new("S015", sold_at()).with_client(client("10000000015"));
        purge.add_product(&product("P7", 700), 1).unwrap();
        let purge = sales.register(purge).await.unwrap();

        admin.purge(&purge).await.unwrap();

        assert!(sales.find_by_id(purge.id.unwrap()).await.unwrap().is_none());
        assert!(sales.find_by_id(keep.id.unwrap()).await.unwrap().is_some());
        assert_eq!(count_rows(&backends.primary, "tb_line_item").await, 2);
        assert_eq!(count_rows(&backends.primary, "tb_client").await, 2);
        assert_eq!(count_rows(&backends.primary, "tb_product").await, 3);
    }

    #[tokio::test]
    async fn test_find_all_loads_graphs() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let sales = SaleRepository::new(backends.secondary.clone());

        sales.register(sale_with_items("S016", "10000000016")).await.unwrap();
        sales
            .register(Sale::new("S017", sold_at()).with_client(client("10000000017")))
            .await
            .unwrap();

        let all = sales.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|sale| sale.client.as_ref().is_some_and(|c| !c.name.is_empty())));
        let quantities: u64 = all.iter().map(Sale::total_product_quantity).sum();
        assert_eq!(quantities, 3);
    }

    #[test]
    fn test_generate_sale_code() {
        let a = generate_sale_code();
        let b = generate_sale_code();

        assert!(a.starts_with("S-"));
        assert_eq!(a.len(), 34);
        assert_ne!(a, b);
    }
}
