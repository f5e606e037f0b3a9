//! # Validation Module
//!
//! Structural validation for clients, products and sales.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure, no I/O)                                   │
//! │  ├── required fields, column lengths, non-negative prices             │
//! │  └── surfaces as ParameterError before any connection is opened       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (tax id, product code, sale code)             │
//! │  └── Foreign key constraints                                           │
//! │      surfaces as StorageError                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The length limits match the column sizes of the persisted layout.

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a product code.
pub const MAX_PRODUCT_CODE_LEN: usize = 10;

/// Maximum length of client and product names.
pub const MAX_NAME_LEN: usize = 50;

/// Maximum length of a product description.
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Maximum length of a street address or city.
pub const MAX_ADDRESS_LEN: usize = 100;

/// Maximum length of a state name.
pub const MAX_STATE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a text field is present (not blank).
///
/// ## Example
/// ```rust
/// use selling_core::validation::validate_required;
///
/// assert!(validate_required("phone", "555-0100").is_ok());
/// assert!(validate_required("phone", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates that a text field is present and at most `max` characters.
///
/// ## Example
/// ```rust
/// use selling_core::validation::validate_text;
///
/// assert!(validate_text("name", "Ada", 50).is_ok());
/// assert!(validate_text("name", "", 50).is_err());
/// assert!(validate_text("name", &"A".repeat(51), 50).is_err());
/// ```
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be blank
/// - At most 10 characters
/// - No whitespace inside the code
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    validate_text("code", code, MAX_PRODUCT_CODE_LEN)?;

    if code.trim().chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative (zero is allowed for free items)
///
/// ## Example
/// ```rust
/// use selling_core::money::Money;
/// use selling_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an entity identifier (generated ids are always positive).
pub fn validate_id(id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "id".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
