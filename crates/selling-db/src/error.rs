//! # Database Error Types
//!
//! The error taxonomy every repository operation reports through.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Classification                                 │
//! │                                                                         │
//! │  repository call                                                        │
//! │       │                                                                 │
//! │       ├── bad entity / bad id ──────────────► Parameter   (no I/O)      │
//! │       │                                                                 │
//! │       ├── forbidden by a business rule ─────► UnsupportedOperation      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ResourceScope::open                                                    │
//! │       ├── connect / BEGIN fails ────────────► Connection                │
//! │       ▼                                                                 │
//! │  SQL work                                                               │
//! │       ├── constraint / query / decode fails ► Storage (rolled back)     │
//! │       ▼                                                                 │
//! │  ResourceScope::finish                                                  │
//! │       └── COMMIT / release fails ───────────► Connection                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no `From<sqlx::Error>`. The same sqlx failure is Connection
//! while opening a scope and Storage inside one; call sites classify it.

use selling_core::{CoreError, ValidationError};
use thiserror::Error;

/// Boxed cause carried by [`DbError::Storage`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Storage operation descriptions.
pub const REGISTER_FAILED: &str = "Error registering entity.";
pub const UPDATE_FAILED: &str = "Error updating entity.";
pub const DELETE_FAILED: &str = "Error deleting entity.";
pub const FIND_FAILED: &str = "Error finding entity by ID.";
pub const FIND_ALL_FAILED: &str = "Error fetching all entities.";
pub const REGISTER_SALE_FAILED: &str = "Error saving sale";

/// Repository operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The caller passed an invalid entity or identifier.
    ///
    /// ## When This Occurs
    /// - Entity fails structural validation (blank code, overlong name, ...)
    /// - Identifier missing on update/delete, or not positive
    ///
    /// Raised before any connection is opened.
    #[error("Invalid parameter: {0}")]
    Parameter(String),

    /// The resource scope could not be opened or closed cleanly.
    ///
    /// ## When This Occurs
    /// - Database file missing and creation disabled
    /// - Parent directory missing, permissions, disk full
    /// - COMMIT or connection release failed after a successful operation
    #[error("{message}")]
    Connection {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// The persistence work itself failed; the transaction was rolled back.
    ///
    /// ## When This Occurs
    /// - UNIQUE, NOT NULL or FOREIGN KEY constraint violation
    /// - Row decoding failure
    #[error("{operation}")]
    Storage {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// A business rule forbids the operation. Not retryable.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// Schema preparation failed while bootstrapping a backend.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Backend configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Creates a Parameter error.
    pub fn parameter(message: impl Into<String>) -> Self {
        DbError::Parameter(message.into())
    }

    /// Creates a Connection error wrapping the infrastructure failure.
    pub fn connection(message: impl Into<String>, source: sqlx::Error) -> Self {
        DbError::Connection {
            message: message.into(),
            source,
        }
    }

    /// Creates a Storage error naming the failed operation.
    pub fn storage(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DbError::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Creates an UnsupportedOperation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        DbError::UnsupportedOperation(message.into())
    }

    /// True if this is a Storage error caused by a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        self.database_cause()
            .map(|db_err| db_err.is_unique_violation())
            .unwrap_or(false)
    }

    /// True if this is a Storage error caused by a FOREIGN KEY constraint.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_cause()
            .map(|db_err| db_err.is_foreign_key_violation())
            .unwrap_or(false)
    }

    fn database_cause(&self) -> Option<&dyn sqlx::error::DatabaseError> {
        match self {
            DbError::Storage { source, .. } => match source.downcast_ref::<sqlx::Error>() {
                Some(sqlx::Error::Database(db_err)) => Some(&**db_err),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Parameter(err.to_string())
    }
}

/// Convert domain errors to the repository taxonomy.
///
/// ## Error Mapping
/// ```text
/// CoreError::UnsupportedOperation   → DbError::UnsupportedOperation
/// CoreError::Validation             → DbError::Parameter
/// CoreError::RemoveExceedsQuantity  → DbError::Parameter
/// ```
impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedOperation(message) => DbError::UnsupportedOperation(message),
            CoreError::Validation(validation) => validation.into(),
            other @ CoreError::RemoveExceedsQuantity { .. } => DbError::Parameter(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
