//! # taproom-core: Pure Business Logic for Taproom POS
//!
//! Everything the inventory-commit engine decides without touching
//! storage: money, the product ledger, sale assembly and reconciliation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taproom POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              UI collaborators (till, reports, printing)         │   │
//! │  │    Cart ──► build_sale ──► commit_sale ──► Receipt print        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ taproom-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ ledger  │ │ builder │ │ cashup  │  │   │
//! │  │   │ Product │ │  Money  │ │ check / │ │ Sale    │ │ expected│  │   │
//! │  │   │ Sale    │ │ TaxRate │ │ deduct  │ │ totals  │ │ variance│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  taproom-db (Database Layer)                    │   │
//! │  │       SQLite collections, commit transaction, migrations        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Products, sale lines, sales, receipts
//! - [`records`] - Audit trail, cash-ups, day shifts, staff, settings
//! - [`entity`] - Collection names and the `Entity` trait the store uses
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Availability checks and deductions
//! - [`builder`] - Cart to candidate Sale
//! - [`cashup`] - Shift reconciliation
//! - [`validation`] - Field rules
//! - [`seed`] - Default catalogue and settings
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; the clock is a parameter
//! 2. **No I/O**: database, network and file system access belong in taproom-db
//! 3. **Integer Money**: minor units in an i64, volumes in whole millilitres
//! 4. **Explicit Errors**: typed enums, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use taproom_core::{check_availability, Money, SaleItem, SeedData};
//!
//! let seed = SeedData::default();
//! let tusker = &seed.products[1];
//!
//! let line = SaleItem::bottle(tusker, 3).unwrap();
//! assert_eq!(line.line_total(), Money::from_major(660));
//! assert!(check_availability(tusker, &line).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod builder;
pub mod cashup;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod money;
pub mod records;
pub mod seed;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use builder::{build_sale, SaleContext, Settlement};
pub use cashup::{last_cash_up_time, CashUpCandidate};
pub use entity::{Collection, Entity};
pub use error::{BuildError, CoreError, CoreResult, ValidationError};
pub use ledger::{apply_deduction, check_availability, plan_deductions};
pub use money::Money;
pub use records::*;
pub use seed::SeedData;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Keeps a mis-scanned or stuck-button cart from turning into a giant sale.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default split-payment tolerance: one currency unit.
pub const DEFAULT_SPLIT_TOLERANCE: Money = Money::from_minor(100);
