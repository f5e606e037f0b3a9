//! # Database Migrations
//!
//! Embedded SQL migrations, applied to every backend at bootstrap.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::prepare(backends)                                           │
//! │       │                                                                 │
//! │       ▼  for primary, secondary, tertiary                               │
//! │  Open a dedicated connection                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                       │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql  (clients, products, sales, items)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record them, close the connection    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::{ConnectOptions, Connection};
use tracing::info;

use crate::config::BackendConfig;
use crate::error::{DbError, DbResult};

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations against one backend.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(config: &BackendConfig) -> DbResult<()> {
    info!(backend = %config.id, path = %config.database_path.display(), "Checking for pending migrations");

    let mut conn = config
        .connect_options()
        .connect()
        .await
        .map_err(|e| DbError::connection("Failed to open connection.", e))?;

    let applied = MIGRATOR.run(&mut conn).await;
    conn.close()
        .await
        .map_err(|e| DbError::connection("Failed to close connection.", e))?;
    applied?;

    info!(backend = %config.id, "All migrations applied successfully");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for one backend.
///
/// A backend that was never prepared reports zero applied migrations.
pub async fn migration_status(config: &BackendConfig) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let mut conn = config
        .connect_options()
        .connect()
        .await
        .map_err(|e| DbError::connection("Failed to open connection.", e))?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&mut conn)
        .await
        .unwrap_or(0);

    conn.close()
        .await
        .map_err(|e| DbError::connection("Failed to close connection.", e))?;

    Ok((total, usize::try_from(applied).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = BackendConfig::new(BackendId::Secondary, dir.path().join("m.db"));

        let (total, applied) = migration_status(&config).await.unwrap();
        assert_eq!(applied, 0);

        run_migrations(&config).await.unwrap();
        run_migrations(&config).await.unwrap();

        let (_, applied) = migration_status(&config).await.unwrap();
        assert_eq!(applied, total);
    }
}
