//! # Error Types
//!
//! Domain-specific error types for selling-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  selling-core errors (this file)                                       │
//! │  ├── CoreError        - Sale aggregate rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  selling-db errors (separate crate)                                    │
//! │  └── DbError          - Parameter / Connection / Storage / Unsupported │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, quantities)
//! 3. Business-rule rejections are their own variant so callers can match on them

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are deterministic outcomes of the aggregate rules, never wrappers
/// around an infrastructure failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The requested operation is forbidden by a business rule.
    ///
    /// ## When This Occurs
    /// - Adding, removing or clearing line items of a FINISHED sale
    #[error("{0}")]
    UnsupportedOperation(String),

    /// A line item was asked to give back more units than it holds.
    ///
    /// Only raised by [`LineItem::remove`](crate::LineItem::remove); the sale
    /// aggregate drops the line instead of over-removing.
    #[error("Cannot remove more than existing quantity.")]
    RemoveExceedsQuantity { existing: u32, requested: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an UnsupportedOperation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        CoreError::UnsupportedOperation(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any storage work runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_exceeds_message() {
        let err = CoreError::RemoveExceedsQuantity {
            existing: 2,
            requested: 5,
        };
        assert_eq!(err.to_string(), "Cannot remove more than existing quantity.");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 50,
        };
        assert_eq!(err.to_string(), "name must be at most 50 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
