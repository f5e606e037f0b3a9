//! # Client Repository
//!
//! Table mapping for clients. All operations come from
//! [`GenericRepository`].
//!
//! ```text
//! tb_client: id | name | tax_id (UNIQUE) | phone | address | address_number | city | state
//! ```

use selling_core::validation::ValidationResult;
use selling_core::{Address, Client};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{GenericRepository, Persistable, SqliteQuery};

/// Client CRUD on one backend.
pub type ClientRepository = GenericRepository<Client>;

impl Persistable for Client {
    const ENTITY: &'static str = "client";
    const TABLE: &'static str = "tb_client";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "tax_id",
        "phone",
        "address",
        "address_number",
        "city",
        "state",
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn validate(&self) -> ValidationResult<()> {
        Client::validate(self)
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.tax_id.clone())
            .bind(self.phone.clone())
            .bind(self.address.street.clone())
            .bind(self.address.number.clone())
            .bind(self.address.city.clone())
            .bind(self.address.state.clone())
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Client {
            id: Some(row.try_get("id")?),
            name: row.try_get("name")?,
            tax_id: row.try_get("tax_id")?,
            phone: row.try_get("phone")?,
            address: Address {
                street: row.try_get("address")?,
                number: row.try_get("address_number")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
            },
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendId;
    use crate::error::DbError;
    use crate::repository::{Repository, SaleRepository};
    use crate::testing::{client, prepared_backends, sold_at};
    use selling_core::Sale;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_then_find() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ClientRepository::new(backends.primary.clone());

        let registered = repo.register(client("11111111111")).await.unwrap();
        let id = registered.id.expect("generated id");

        let found = repo.find_by_id(id).await.unwrap().expect("client found");
        assert_eq!(found, registered);
        assert_eq!(found.address.city, "Test City");
    }

    #[tokio::test]
    async fn test_update_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ClientRepository::new(backends.primary.clone());

        let registered = repo.register(client("22222222222")).await.unwrap();

        let mut first = registered.clone();
        first.name = "First Writer".to_string();
        let mut second = registered.clone();
        second.name = "Second Writer".to_string();

        repo.update(first).await.unwrap();
        repo.update(second).await.unwrap();

        let found = repo.find_by_id(registered.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.name, "Second Writer");
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_then_find_is_absent() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ClientRepository::new(backends.primary.clone());

        let registered = repo.register(client("33333333333")).await.unwrap();
        repo.delete(&registered).await.unwrap();

        assert!(repo.find_by_id(registered.id.unwrap()).await.unwrap().is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tax_id_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ClientRepository::new(backends.primary.clone());

        repo.register(client("44444444444")).await.unwrap();
        let err = repo.register(client("44444444444")).await.unwrap_err();

        assert!(matches!(err, DbError::Storage { .. }));
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "Error registering entity.");
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_parameter_errors_never_touch_storage() {
        let dir = TempDir::new().unwrap();
        // nothing exists at this path and it may not be created
        let unreachable = crate::config::BackendConfig::new(
            BackendId::Primary,
            dir.path().join("absent").join("nowhere.db"),
        )
        .create_if_missing(false);
        let repo = ClientRepository::new(unreachable);

        let mut invalid = client("55555555555");
        invalid.name = String::new();
        assert!(matches!(repo.register(invalid).await, Err(DbError::Parameter(_))));

        let unsaved = client("55555555555");
        assert!(matches!(repo.update(unsaved.clone()).await, Err(DbError::Parameter(_))));
        assert!(matches!(repo.delete(&unsaved).await, Err(DbError::Parameter(_))));
        assert!(matches!(repo.find_by_id(0).await, Err(DbError::Parameter(_))));
        assert!(matches!(repo.find_by_id(-1).await, Err(DbError::Parameter(_))));

        // the same repository does reach storage for a well-formed call
        assert!(matches!(repo.find_all().await, Err(DbError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_delete_client_referenced_by_sale_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let repo = ClientRepository::new(backends.primary.clone());
        let sales = SaleRepository::new(backends.primary.clone());

        let buyer = repo.register(client("77777777777")).await.unwrap();
        sales
            .register(Sale::new("S-FK", sold_at()).with_client(buyer.clone()))
            .await
            .unwrap();

        let err = repo.delete(&buyer).await.unwrap_err();
        assert!(matches!(err, DbError::Storage { .. }));
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation());
        assert_eq!(err.to_string(), "Error deleting entity.");

        assert!(repo.find_by_id(buyer.id.unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_backends_are_independent() {
        let dir = TempDir::new().unwrap();
        let backends = prepared_backends(&dir).await;
        let primary = ClientRepository::new(backends.get(BackendId::Primary).clone());
        let tertiary = ClientRepository::new(backends.get(BackendId::Tertiary).clone());

        primary.register(client("66666666666")).await.unwrap();

        assert_eq!(primary.backend(), BackendId::Primary);
        assert_eq!(primary.find_all().await.unwrap().len(), 1);
        assert!(tertiary.find_all().await.unwrap().is_empty());

        // same tax id is free on another backend
        tertiary.register(client("66666666666")).await.unwrap();
    }
}
