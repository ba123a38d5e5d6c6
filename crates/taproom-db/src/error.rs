//! # Database Error Types
//!
//! Storage errors plus the operation-level errors the store's commands
//! return to UI collaborators.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / MigrateError / serde_json::Error                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Adds context and categorization                             │
//! │       │                                                                 │
//! │       ├──► CommitError::StorageFailure ◄── CoreError (ledger)          │
//! │       └──► SettleError::StorageFailure ◄── CoreError (lifecycle)       │
//! │                                                                         │
//! │  UI: availability errors keep the cart, DayClosed asks for a reopen,   │
//! │      storage errors are shown as-is                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use taproom_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - A migration or import inserts a duplicate primary key
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    ///
    /// ## When This Occurs
    /// - Invalid SQL in migration
    /// - An applied migration was edited (checksum mismatch)
    /// - The file was written by a newer build (unknown migration)
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The database was busy or locked by another writer.
    ///
    /// Nothing was written; the caller may retry.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored document could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An entity failed its field rules before being written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True for busy/locked conflicts and pool timeouts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Conflict(_) | DbError::PoolExhausted)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint, busy/locked, or QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLITE_BUSY / SQLITE_LOCKED surface as "database is locked"
                // or "database table is locked".
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("locked") || msg.contains("busy") {
                    DbError::Conflict(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Commit Error
// =============================================================================

/// Why `Database::commit_sale` refused or failed.
///
/// Every variant except `StorageFailure` is detected before anything is
/// written. `StorageFailure` rolls the whole transaction back. Either way no
/// part of the sale is visible afterwards.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The business day of the sale has been closed.
    #[error("Day {day} is closed; reopen it before selling")]
    DayClosed { day: String },

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    #[error(
        "Insufficient volume in {product_id}: requested {requested_ml}ml, available {available_ml}ml"
    )]
    InsufficientVolume {
        product_id: String,
        requested_ml: i64,
        available_ml: i64,
    },

    #[error("Invalid line for {product_id}: {reason}")]
    InvalidLineItem { product_id: String, reason: String },

    #[error("Ledger invariant violated for {product_id}: {reason}")]
    LedgerInvariant { product_id: String, reason: String },

    /// The sale or receipt is malformed (no lines, receipt for another sale).
    #[error("Invalid sale: {reason}")]
    InvalidSale { reason: String },

    /// A sale with this id was already committed.
    #[error("Sale {sale_id} already exists")]
    DuplicateSale { sale_id: String },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] DbError),
}

impl From<CoreError> for CommitError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CommitError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            CoreError::InsufficientVolume {
                product_id,
                requested_ml,
                available_ml,
            } => CommitError::InsufficientVolume {
                product_id,
                requested_ml,
                available_ml,
            },
            CoreError::InvalidLineItem { product_id, reason } => {
                CommitError::InvalidLineItem { product_id, reason }
            }
            CoreError::LedgerInvariant { product_id, reason } => {
                CommitError::LedgerInvariant { product_id, reason }
            }
            other => CommitError::InvalidSale {
                reason: other.to_string(),
            },
        }
    }
}

impl CommitError {
    /// True when the UI should keep the cart and let the cashier adjust it.
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            CommitError::InsufficientStock { .. } | CommitError::InsufficientVolume { .. }
        )
    }
}

// =============================================================================
// Settle Error
// =============================================================================

/// Why `Database::settle_sale` failed.
#[derive(Debug, Error)]
pub enum SettleError {
    #[error("Sale not found: {sale_id}")]
    SaleNotFound { sale_id: String },

    /// Already settled, or the amount received is short.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] DbError),
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_commit_errors() {
        let err: CommitError = CoreError::InsufficientStock {
            product_id: "P1".to_string(),
            requested: 3,
            available: 2,
        }
        .into();
        assert!(err.is_availability());
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P1: requested 3, available 2"
        );
    }

    #[test]
    fn test_conflict_is_retryable() {
        assert!(DbError::Conflict("database is locked".to_string()).is_retryable());
        assert!(!DbError::not_found("Sale", "x").is_retryable());
    }
}
