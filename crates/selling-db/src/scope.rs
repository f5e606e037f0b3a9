//! # Resource Scope
//!
//! One connection and one transaction for exactly one repository operation.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scope Lifecycle                                    │
//! │                                                                         │
//! │  ResourceScope::open(&backend)                                         │
//! │       │  connect (fresh, never pooled)                                  │
//! │       │  BEGIN IMMEDIATE                                                │
//! │       │  ── failure ──────────────────────► DbError::Connection        │
//! │       ▼                                                                 │
//! │  scope.connection()  ← repository SQL runs here                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scope.finish(outcome, operation)                                      │
//! │       │                                                                 │
//! │       ├── Ok  → COMMIT → close                                         │
//! │       │         └── failure ──────────────► DbError::Connection        │
//! │       │                                                                 │
//! │       └── Err → ROLLBACK → close                                       │
//! │                 └── failure is logged; ──► DbError::Storage            │
//! │                     the original cause is what the caller sees          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `finish` consumes the scope, so a scope can be closed at most once and
//! never reused. A scope dropped without `finish` (caller future cancelled)
//! drops its connection; SQLite discards the open transaction.

use sqlx::{ConnectOptions, Connection, SqliteConnection};
use tracing::{debug, warn};

use crate::config::{BackendConfig, BackendId};
use crate::error::{BoxError, DbError, DbResult};

/// An open connection with a transaction in progress.
#[derive(Debug)]
pub struct ResourceScope {
    conn: SqliteConnection,
    backend: BackendId,
}

impl ResourceScope {
    /// Opens a fresh connection to `config` and begins a transaction.
    ///
    /// ## Errors
    /// `DbError::Connection` if the database cannot be opened or the
    /// transaction cannot start.
    pub async fn open(config: &BackendConfig) -> DbResult<Self> {
        let mut conn = config
            .connect_options()
            .connect()
            .await
            .map_err(|e| DbError::connection("Failed to open connection.", e))?;

        if let Err(e) = sqlx::query("BEGIN IMMEDIATE").execute(&mut conn).await {
            release(conn, config.id).await;
            return Err(DbError::connection("Failed to open connection.", e));
        }

        debug!(backend = %config.id, "Scope opened");
        Ok(ResourceScope {
            conn,
            backend: config.id,
        })
    }

    /// The connection the operation runs on.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    /// Closes the scope according to the operation's outcome.
    ///
    /// A successful outcome is committed; a failed one is rolled back and
    /// reported as `DbError::Storage` naming `operation`.
    pub async fn finish<T, E>(self, outcome: Result<T, E>, operation: &str) -> DbResult<T>
    where
        E: Into<BoxError>,
    {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(cause) => {
                self.rollback().await;
                Err(DbError::storage(operation, cause))
            }
        }
    }

    async fn commit(mut self) -> DbResult<()> {
        if let Err(e) = sqlx::query("COMMIT").execute(&mut self.conn).await {
            release(self.conn, self.backend).await;
            return Err(DbError::connection("Failed to close connection.", e));
        }

        self.conn
            .close()
            .await
            .map_err(|e| DbError::connection("Failed to close connection.", e))?;

        debug!(backend = %self.backend, "Scope committed");
        Ok(())
    }

    async fn rollback(mut self) {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut self.conn).await {
            warn!(backend = %self.backend, error = %e, "Rollback failed");
        }
        release(self.conn, self.backend).await;
        debug!(backend = %self.backend, "Scope rolled back");
    }
}

/// Closes a connection whose failure is already being reported.
async fn release(conn: SqliteConnection, backend: BackendId) {
    if let Err(e) = conn.close().await {
        warn!(backend = %backend, error = %e, "Failed to release connection");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
