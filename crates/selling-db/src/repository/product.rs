//! # Product Repository
//!
//! Table mapping for products. All operations come from
//! [`GenericRepository`].
//!
//! ```text
//! tb_product: id | code (UNIQUE) | name | description | price_cents
//! ```
//!
//! Prices are stored as integer cents, so a stored product reads back
//! with exactly the price it was written with.

use selling_core::validation::ValidationResult;
use selling_core::{Money, Product};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{GenericRepository, Persistable, SqliteQuery};

/// Product CRUD on one backend.
pub type ProductRepository = GenericRepository<Product>;

impl Persistable for Product {
    const ENTITY: &'static str = "product";
    const TABLE: &'static str = "tb_product";
    const COLUMNS: &'static [&'static str] = &["code", "name", "description", "price_cents"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn validate(&self) -> ValidationResult<()> {
        Product::validate(self)
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.code.clone())
            .bind(self.name.clone())
            .bind(self.description.clone())
            .bind(self.price)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Product {
            id: Some(row.try_get("id")?),
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get::<Money, _>("price_cents")?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::{Repository, SaleRepository};
    use crate::testing::{client, prepared_backends, product, sold_at};
    use selling_core::Sale;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_then_find() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());

        let registered = repo.register(product("A1", 1099)).await.unwrap();
        let found = repo
            .find_by_id(registered.id.unwrap())
            .await
            .unwrap()
            .expect("product found");

        assert_eq!(found, registered);
        assert_eq!(found.price, Money::from_cents(1099));
    }

    #[tokio::test]
    async fn test_update_changes_price() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());

        let mut registered = repo.register(product("A2", 500)).await.unwrap();
        registered.price = Money::from_cents(750);
        registered.description = "Repriced".to_string();
        let updated = repo.update(registered.clone()).await.unwrap();

        assert_eq!(updated, registered);
        let found = repo.find_by_id(updated.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.price, Money::from_cents(750));
        assert_eq!(found.description, "Repriced");
    }

    #[tokio::test]
    async fn test_find_all_and_delete() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());

        let a = repo.register(product("A3", 100)).await.unwrap();
        let b = repo.register(product("A4", 200)).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let codes: Vec<_> = all.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes.len(), 2);
        assert!(codes.contains(&"A3") && codes.contains(&"A4"));

        repo.delete(&a).await.unwrap();
        assert!(repo.find_by_id(a.id.unwrap()).await.unwrap().is_none());
        assert!(repo.find_by_id(b.id.unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());

        repo.register(product("DUP", 100)).await.unwrap();
        let err = repo.register(product("DUP", 200)).await.unwrap_err();

        assert!(matches!(err, DbError::Storage { .. }));
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_negative_price_is_parameter_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());

        let err = repo.register(product("NEG", -1)).await.unwrap_err();
        assert!(matches!(err, DbError::Parameter(_)));
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_product_on_a_sale_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());
        let sales = SaleRepository::new(backends.secondary.clone());

        let sold = repo.register(product("FK1", 300)).await.unwrap();
        let mut sale = Sale::new("S-FK", sold_at()).with_client(client("88888888888"));
        sale.add_product(&sold, 2).unwrap();
        sales.register(sale).await.unwrap();

        let err = repo.delete(&sold).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert!(repo.find_by_id(sold.id.unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_id_is_absent() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ProductRepository::new(backends.secondary.clone());

        assert!(repo.find_by_id(9_999).await.unwrap().is_none());
    }
}
