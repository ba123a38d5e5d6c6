//! # taproom-db: Storage Layer for Taproom POS
//!
//! Transactional collection store over SQLite, plus the inventory-commit
//! engine that turns a cart into a sale, a receipt, stock deductions and an
//! audit entry in one atomic step.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taproom POS Data Flow                            │
//! │                                                                         │
//! │  UI: cart → build_sale (taproom-core)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    taproom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Repository<T> │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial_ │  │   │
//! │  │   │ writer lock   │    │ ShiftRepo     │    │  schema.sql  │  │   │
//! │  │   │ read stats    │    │ snapshot      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   one (id, body, updated_at) table per collection               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the [`Database`] handle
//! - [`repository`] - Collection CRUD, sale commit, day gate, snapshots
//! - [`migrations`] - Embedded database migrations
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - Storage, commit, settle and config errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taproom_core::{build_sale, AppSettings, PaymentMethod, Receipt, SETTINGS_ID};
//! use taproom_db::{AppConfig, Database};
//!
//! let config = AppConfig::load(None)?;
//! let db = Database::new(config.to_db_config()).await?;
//!
//! let settings = db.repo::<AppSettings>().get_by_id(SETTINGS_ID).await?;
//! let ctx = config.sale_context(settings.as_ref(), PaymentMethod::Cash, "e2", Utc::now());
//! let sale = build_sale(&cart, &ctx)?;
//! db.commit_sale(&sale, &Receipt::for_sale(&sale, text)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{CommitError, ConfigError, DbError, DbResult, SettleError};
pub use logging::init_tracing;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{Repository, SaleRepository, ShiftRepository, StoreSnapshot, StoreStats};
