//! # Error Types
//!
//! Domain-specific error types for taproom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  taproom-core errors (this file)                                       │
//! │  ├── ValidationError  - Field-level input failures                     │
//! │  ├── BuildError       - Cart could not become a Sale                   │
//! │  └── CoreError        - Ledger and sale lifecycle failures             │
//! │                                                                         │
//! │  taproom-db errors (separate crate)                                    │
//! │  ├── DbError          - Storage failures                               │
//! │  └── CommitError      - What commit_sale returns to the UI             │
//! │                                                                         │
//! │  Flow: CoreError ──► CommitError ◄── DbError                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::{LineKind, SaleStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Ledger and lifecycle errors.
///
/// Raised by the pure inventory functions and by sale state transitions.
/// None of them imply anything was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A bottle line asks for more units than are on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: Tusker × 3
    ///      │
    ///      ▼
    /// check_availability: stock = 2
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "2", requested: 3, available: 2 }
    ///      │
    ///      ▼
    /// UI: "Only 2 Tusker Lager left", cart kept as-is
    /// ```
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// A drum pour needs more liquid than the drum holds.
    #[error(
        "Insufficient volume in {product_id}: requested {requested_ml}ml, available {available_ml}ml"
    )]
    InsufficientVolume {
        product_id: String,
        requested_ml: i64,
        available_ml: i64,
    },

    /// The line cannot be applied to the product it references.
    ///
    /// ## When This Occurs
    /// - Bottle line against a drum product (or a pour against a bottle)
    /// - Drum pour without a volume
    /// - Quantity below one
    #[error("Invalid line for {product_id}: {reason}")]
    InvalidLineItem { product_id: String, reason: String },

    /// A deduction would push stock or level out of range.
    ///
    /// Only reachable when a caller skipped `check_availability` or read a
    /// stale product. The deduction fails instead of clamping.
    #[error("Ledger invariant violated for {product_id}: {reason}")]
    LedgerInvariant { product_id: String, reason: String },

    /// Sale is not in a state that allows the requested operation.
    #[error("Sale {sale_id} is {current_status:?}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: SaleStatus,
    },

    /// Payment handed over does not cover the sale.
    #[error("Payment of {received} does not cover total {required}")]
    InsufficientPayment { required: Money, received: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub(crate) fn invalid_line(product_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidLineItem {
            product_id: product_id.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn kind_mismatch(product_id: &str, line: LineKind, category: &str) -> Self {
        CoreError::invalid_line(
            product_id,
            format!("{} line cannot be sold from a {} product", line, category),
        )
    }
}

// =============================================================================
// Build Error
// =============================================================================

/// Reasons a cart cannot be turned into a candidate Sale.
///
/// Detected before any persistence is attempted; the caller fixes the input
/// and resubmits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Cart is empty")]
    EmptyCart,

    /// Split components do not add up to the sale total.
    #[error("Split payment sums to {got}, expected {expected}")]
    SplitMismatch { expected: Money, got: Money },

    #[error("Cart cannot have more than {max} lines")]
    TooManyItems { max: usize },

    /// A line failed field validation.
    #[error("Invalid cart line {line_id}: {source}")]
    InvalidItem {
        line_id: String,
        #[source]
        source: ValidationError,
    },

    /// Cash handed over is less than the total.
    #[error("Tendered {received} is less than total {required}")]
    InsufficientTender { required: Money, received: Money },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed day key).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two pour options with the same label).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "P1".to_string(),
            requested: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P1: requested 3, available 2"
        );

        let err = CoreError::InsufficientVolume {
            product_id: "D1".to_string(),
            requested_ml: 500,
            available_ml: 400,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient volume in D1: requested 500ml, available 400ml"
        );
    }

    #[test]
    fn test_build_error_messages() {
        let err = BuildError::SplitMismatch {
            expected: Money::from_major(500),
            got: Money::from_major(450),
        };
        assert_eq!(err.to_string(), "Split payment sums to 450.00, expected 500.00");
        assert_eq!(BuildError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
