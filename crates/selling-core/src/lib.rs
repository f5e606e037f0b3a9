//! # selling-core: Pure Business Logic for Selling
//!
//! This crate holds the selling domain: clients, products and the sale
//! aggregate, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Selling Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Callers (seed tool, services)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ selling-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ validation│  │   │
//! │  │   │  Client   │  │   Money   │  │   Sale    │  │   rules   │  │   │
//! │  │   │  Product  │  │           │  │ LineItem  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  selling-db (Persistence Layer)                 │   │
//! │  │     generic repositories, sale repository, backends, schema     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Client, Product and SaleStatus
//! - [`sale`] - The Sale aggregate and its line items
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Structural validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use selling_core::{Money, Product, Sale, SaleStatus};
//!
//! let pen = Product {
//!     code: "P001".to_string(),
//!     name: "Pen".to_string(),
//!     description: "Blue pen".to_string(),
//!     price: Money::from_cents(250),
//!     ..Default::default()
//! };
//!
//! let mut sale = Sale::new("S001", Utc::now());
//! sale.add_product(&pen, 4).unwrap();
//! assert_eq!(sale.total_price().to_string(), "10.00");
//!
//! sale.status = SaleStatus::Finished;
//! assert!(sale.add_product(&pen, 1).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use selling_core::Money` instead of
// `use selling_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{LineItem, Sale, FINISHED_SALE_MESSAGE};
pub use types::*;
