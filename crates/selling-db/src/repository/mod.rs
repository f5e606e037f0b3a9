//! # Repository Module
//!
//! The repository contract and its storage implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Contract, One Implementation                     │
//! │                                                                         │
//! │  Repository<T, E>            (register/update/delete/find_by_id/all)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GenericRepository<T>  ← bound to one BackendConfig at construction    │
//! │       │                                                                 │
//! │       │  T: Persistable    (table, columns, binding, row decoding)     │
//! │       │                                                                 │
//! │       ├── ClientRepository  = GenericRepository<Client>                │
//! │       ├── ProductRepository = GenericRepository<Product>               │
//! │       └── SaleRepository    wraps GenericRepository<Sale>              │
//! │              + finalize_sale / cancel_sale / find_with_collections     │
//! │              + delete always refused                                   │
//! │                                                                         │
//! │  Every call: validate → ResourceScope::open → SQL → finish             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`] - Client CRUD
//! - [`ProductRepository`] - Product CRUD
//! - [`SaleRepository`] - Sale CRUD without delete, plus sale operations
//! - [`SaleAdminRepository`] - Administrative sale removal

pub mod client;
pub mod generic;
pub mod product;
pub mod sale;

use async_trait::async_trait;
use selling_core::validation::ValidationResult;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Sqlite, SqliteConnection};

use crate::error::DbResult;

pub use client::ClientRepository;
pub use generic::GenericRepository;
pub use product::ProductRepository;
pub use sale::{generate_sale_code, SaleAdminRepository, SaleOperations, SaleRepository};

/// A runtime-checked SQLite query with its bound arguments.
pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

// =============================================================================
// Repository Contract
// =============================================================================

/// The data-access contract shared by every entity type `T` with
/// identifier type `E`.
///
/// Every method runs in its own connection and transaction. Parameter
/// checks happen before any connection is opened.
#[async_trait]
pub trait Repository<T, E>: Send + Sync {
    /// Stores a new entity and returns it carrying its generated identifier.
    async fn register(&self, entity: T) -> DbResult<T>;

    /// Writes the entity's current state over the stored one (last write
    /// wins) and returns the merged entity.
    async fn update(&self, entity: T) -> DbResult<T>;

    /// Removes a stored entity.
    async fn delete(&self, entity: &T) -> DbResult<()>;

    /// Looks up an entity; absence is `Ok(None)`, never an error.
    async fn find_by_id(&self, id: E) -> DbResult<Option<T>>;

    /// Every stored entity of this type.
    async fn find_all(&self) -> DbResult<Vec<T>>;
}

// =============================================================================
// Entity Mapping
// =============================================================================

/// How an entity maps onto its table.
///
/// `COLUMNS` excludes `id` and is the order [`bind_columns`] binds in.
/// The `*_owned` hooks run on the same connection as the entity's own row
/// and are how an aggregate writes, loads and removes the rows it owns.
///
/// [`bind_columns`]: Persistable::bind_columns
#[async_trait]
pub trait Persistable: Clone + Send + Sync + 'static {
    /// Entity name used in log events.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Structural checks run before any storage work.
    fn validate(&self) -> ValidationResult<()>;

    /// Binds one value per entry of `COLUMNS`, in order.
    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    /// Decodes a row selected as `id, COLUMNS...`.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;

    /// Writes owned rows after the entity's own row.
    async fn persist_owned(&mut self, _conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }

    /// Loads owned rows after the entity's own row was decoded.
    async fn load_owned(&mut self, _conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }

    /// Removes owned rows before the entity's own row.
    async fn remove_owned(&self, _conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
