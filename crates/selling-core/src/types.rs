//! # Domain Types
//!
//! Client, product and sale status: the entities the sale aggregate refers to.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │    Product      │   │   SaleStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  Started        │       │
//! │  │  name           │   │  code (unique)  │   │  Finished       │       │
//! │  │  tax_id (uniq.) │   │  name           │   │  Cancelled      │       │
//! │  │  phone          │   │  description    │   └─────────────────┘       │
//! │  │  address        │   │  price (Money)  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! `id` is `None` until the entity is registered; storage generates it.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::validation::{
    validate_price, validate_product_code, validate_required, validate_text, ValidationResult,
    MAX_ADDRESS_LEN, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_STATE_LEN,
};

// =============================================================================
// Client
// =============================================================================

/// Postal address of a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub city: String,
    pub state: String,
}

/// A client buying through sales. Owns no relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Generated identifier, `None` before registration.
    pub id: Option<i64>,

    pub name: String,

    /// National tax id, unique across clients.
    pub tax_id: String,

    pub phone: String,

    pub address: Address,
}

impl Client {
    /// Checks required fields and column lengths.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_text("name", &self.name, MAX_NAME_LEN)?;
        validate_required("tax_id", &self.tax_id)?;
        validate_required("phone", &self.phone)?;
        validate_text("address", &self.address.street, MAX_ADDRESS_LEN)?;
        validate_required("address_number", &self.address.number)?;
        validate_text("city", &self.address.city, MAX_ADDRESS_LEN)?;
        validate_text("state", &self.address.state, MAX_STATE_LEN)?;
        Ok(())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product that can be sold.
///
/// Line items copy `price` into their subtotal when quantities change, so a
/// later price edit never rewrites an existing sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Generated identifier, `None` before registration.
    pub id: Option<i64>,

    /// Business identifier, unique across products. Line items match on it.
    pub code: String,

    pub name: String,

    pub description: String,

    /// Unit price, never negative.
    pub price: Money,
}

impl Product {
    /// Checks required fields, column lengths and the price sign.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_code(&self.code)?;
        validate_text("name", &self.name, MAX_NAME_LEN)?;
        validate_text("description", &self.description, MAX_DESCRIPTION_LEN)?;
        validate_price(self.price)?;
        Ok(())
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// `Finished` and `Cancelled` are terminal. The aggregate only guards
/// mutations on the current value; callers assign transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    /// Sale is open; line items may change.
    #[default]
    Started,
    /// Sale was concluded; line items are frozen.
    Finished,
    /// Sale was called off.
    Cancelled,
}

impl SaleStatus {
    /// All statuses in declaration order.
    pub const ALL: [SaleStatus; 3] = [
        SaleStatus::Started,
        SaleStatus::Finished,
        SaleStatus::Cancelled,
    ];

    /// The stored name of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Started => "STARTED",
            SaleStatus::Finished => "FINISHED",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }

    /// Case-insensitive lookup by name; `None` for an unknown name.
    ///
    /// ## Example
    /// ```rust
    /// use selling_core::SaleStatus;
    ///
    /// assert_eq!(SaleStatus::from_name("started"), Some(SaleStatus::Started));
    /// assert_eq!(SaleStatus::from_name("FINISHED"), Some(SaleStatus::Finished));
    /// assert_eq!(SaleStatus::from_name("nonexistent"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<SaleStatus> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            id: None,
            name: "Test Client".to_string(),
            tax_id: "99999999999".to_string(),
            phone: "00000-0000".to_string(),
            address: Address {
                street: "Test Street".to_string(),
                number: "1".to_string(),
                city: "Test City".to_string(),
                state: "Test State".to_string(),
            },
        }
    }

    #[test]
    fn test_client_validation() {
        assert!(client().validate().is_ok());

        let mut missing_tax_id = client();
        missing_tax_id.tax_id = " ".to_string();
        assert!(missing_tax_id.validate().is_err());

        let mut long_state = client();
        long_state.address.state = "S".repeat(MAX_STATE_LEN + 1);
        assert!(long_state.validate().is_err());
    }

    #[test]
    fn test_product_validation() {
        let product = Product {
            id: None,
            code: "TEST123".to_string(),
            name: "Test Product".to_string(),
            description: "Test Description".to_string(),
            price: Money::from_cents(1000),
        };
        assert!(product.validate().is_ok());

        let negative = Product {
            price: Money::from_cents(-1),
            ..product.clone()
        };
        assert!(negative.validate().is_err());

        let blank_code = Product {
            code: String::new(),
            ..product
        };
        assert!(blank_code.validate().is_err());
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Started);
    }

    #[test]
    fn test_sale_status_from_name() {
        assert_eq!(SaleStatus::from_name("started"), Some(SaleStatus::Started));
        assert_eq!(SaleStatus::from_name("STARTED"), Some(SaleStatus::Started));
        assert_eq!(SaleStatus::from_name("Cancelled"), Some(SaleStatus::Cancelled));
        assert_eq!(SaleStatus::from_name("nonexistent"), None);
        assert_eq!(SaleStatus::from_name(""), None);
    }

    #[test]
    fn test_sale_status_serializes_as_stored_name() {
        let json = serde_json::to_string(&SaleStatus::Finished).unwrap();
        assert_eq!(json, "\"FINISHED\"");
    }
}
