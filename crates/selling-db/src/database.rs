//! # Database Handle
//!
//! Bootstrap for the three backends and a factory for repositories bound
//! to one of them.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Backend Bootstrap                                  │
//! │                                                                         │
//! │  BackendsConfig::load(path)   ← defaults, TOML file, environment       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::prepare(backends).await                                     │
//! │       │  for primary, secondary, tertiary:                              │
//! │       │    create the parent directory                                  │
//! │       │    run embedded migrations                                      │
//! │       ▼                                                                 │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐                        │
//! │  │  primary   │  │ secondary  │  │  tertiary  │   (independent files)  │
//! │  └────────────┘  └────────────┘  └────────────┘                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.clients(id) / db.products(id) / db.sales(id)                       │
//! │  (each repository opens its own connection per operation)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No connection is held between operations, so the handle is cheap to
//! clone and share.

use sqlx::Executor;
use tracing::{debug, info};

use crate::config::{BackendConfig, BackendId, BackendsConfig};
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{ClientRepository, ProductRepository, SaleAdminRepository, SaleRepository};
use crate::scope::ResourceScope;

/// Prepared backends plus repository access.
///
/// ## Usage
/// ```rust,ignore
/// let backends = BackendsConfig::load(Some(Path::new("selling.toml")))?;
/// let db = Database::prepare(backends).await?;
///
/// let client = db.clients(BackendId::Primary).register(client).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    backends: BackendsConfig,
}

impl Database {
    /// Makes every backend ready for use.
    ///
    /// ## What This Does
    /// 1. Creates the directory holding each database file
    /// 2. Runs pending migrations on each backend
    ///
    /// Backends are prepared in identity order; the first failure stops
    /// the bootstrap.
    pub async fn prepare(backends: BackendsConfig) -> DbResult<Self> {
        for backend in backends.iter() {
            info!(
                backend = %backend.id,
                path = %backend.database_path.display(),
                "Preparing backend"
            );
            ensure_parent_dir(backend)?;
            migrations::run_migrations(backend).await?;
        }

        info!("All backends ready");
        Ok(Database { backends })
    }

    pub fn backends(&self) -> &BackendsConfig {
        &self.backends
    }

    pub fn backend(&self, id: BackendId) -> &BackendConfig {
        self.backends.get(id)
    }

    /// Client repository bound to `id`.
    pub fn clients(&self, id: BackendId) -> ClientRepository {
        ClientRepository::new(self.backend(id).clone())
    }

    /// Product repository bound to `id`.
    pub fn products(&self, id: BackendId) -> ProductRepository {
        ProductRepository::new(self.backend(id).clone())
    }

    /// Sale repository bound to `id`.
    pub fn sales(&self, id: BackendId) -> SaleRepository {
        SaleRepository::new(self.backend(id).clone())
    }

    /// Administrative sale removal on `id`.
    pub fn sale_admin(&self, id: BackendId) -> SaleAdminRepository {
        SaleAdminRepository::new(self.backend(id).clone())
    }

    /// Checks that a backend can be opened and queried.
    ///
    /// ## Returns
    /// * `true` - Backend is responsive
    /// * `false` - Backend is unavailable
    pub async fn health_check(&self, id: BackendId) -> bool {
        let Ok(mut scope) = ResourceScope::open(self.backend(id)).await else {
            return false;
        };

        let outcome = scope.connection().execute("SELECT 1").await;
        scope.finish(outcome, "Health check failed.").await.is_ok()
    }
}

fn ensure_parent_dir(backend: &BackendConfig) -> DbResult<()> {
    if !backend.create_if_missing {
        return Ok(());
    }

    match backend.database_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            debug!(dir = %parent.display(), "Ensuring database directory");
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Config(format!("cannot create {}: {}", parent.display(), e))
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
