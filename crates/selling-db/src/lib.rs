//! # selling-db: Persistence Layer for Selling
//!
//! This crate stores clients, products and sales in SQLite backends.
//! It uses sqlx for async access with runtime-checked queries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Selling Data Flow                                │
//! │                                                                         │
//! │  Caller (service, CLI, seed binary)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   selling-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (database.rs) │    │  (generic.rs) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ BackendsConfig│    │ ClientRepo    │    │ 001_initial_ │  │   │
//! │  │   │ prepare()     │───►│ ProductRepo   │    │   schema.sql │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                        ResourceScope (scope.rs)                │   │
//! │  │                  one connection + transaction per call         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                  │
//! │  │   primary    │  │  secondary   │  │   tertiary   │  SQLite files    │
//! │  └──────────────┘  └──────────────┘  └──────────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Backend identities and their configuration
//! - [`database`] - Bootstrap and repository factory
//! - [`scope`] - Per-operation connection and transaction
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error taxonomy
//! - [`repository`] - Repository contract and implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use selling_db::{BackendId, BackendsConfig, Database, Repository, SaleOperations};
//!
//! let db = Database::prepare(BackendsConfig::load(None)?).await?;
//!
//! let sales = db.sales(BackendId::Primary);
//! let mut sale = sales.register(sale).await?;
//! sale.status = SaleStatus::Finished;
//! sales.finalize_sale(&sale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod database;
pub mod error;
pub mod migrations;
pub mod repository;
pub mod scope;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{BackendConfig, BackendId, BackendsConfig};
pub use database::Database;
pub use error::{DbError, DbResult};
pub use scope::ResourceScope;

// Repository re-exports for convenience
pub use repository::{
    generate_sale_code, ClientRepository, GenericRepository, Persistable, ProductRepository,
    Repository, SaleAdminRepository, SaleOperations, SaleRepository,
};
