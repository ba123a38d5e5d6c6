//! # Database Pool Management
//!
//! Connection pool creation and the `Database` handle UI collaborators hold.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │  Store (cloned into every repository)   │                           │
//! │  │  ├── SqlitePool                         │  readers run in parallel  │
//! │  │  ├── writer: Mutex<()>                  │  one write path at a time │
//! │  │  └── stats: per-collection read counts  │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ├── db.repo::<T>()        generic CRUD                            │
//! │       ├── db.commit_sale(..)    inventory-commit transaction            │
//! │       ├── db.settle_sale(..)    issued → settled                        │
//! │       ├── db.shifts()           day gate                                │
//! │       └── db.load_all_collections / restore / clear_all                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Readers don't block the writer
//! - The writer doesn't block readers
//! - Better crash recovery

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{CommitError, DbError, DbResult, SettleError};
use crate::migrations;
use crate::repository::{self, Repository, SaleRepository, ShiftRepository, Store, StoreSnapshot, StoreStats};
use taproom_core::{Entity, Money, Receipt, Sale, SeedData};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/taproom.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a single till)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long SQLite waits on a locked database before reporting busy.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the SQLite busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; clones share the pool, the writer lock and the stats.
///
/// ## Usage
/// ```rust,ignore
/// let sale = build_sale(&cart, &ctx)?;
/// let receipt = Receipt::for_sale(&sale, printer.render(&sale));
/// match db.commit_sale(&sale, &receipt).await {
///     Ok(()) => cart.clear(),
///     Err(e) if e.is_availability() => show_stock_warning(e),
///     Err(e) => show_error(e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    store: Store,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Busy timeout
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path creates file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // Durable at every commit boundary in WAL mode; a crash can only
            // lose transactions that never committed.
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            store: Store::new(pool),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Applies pending migrations in order and records them in
    /// `_sqlx_migrations`. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.store.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.store.pool
    }

    /// Generic repository for one collection.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let products = db.repo::<Product>().get_all(None).await?;
    /// ```
    pub fn repo<T: Entity>(&self) -> Repository<T> {
        Repository::new(self.store.clone())
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.store.clone())
    }

    /// Returns the day-shift repository.
    pub fn shifts(&self) -> ShiftRepository {
        ShiftRepository::new(self.store.clone())
    }

    /// Read counters per collection.
    pub fn stats(&self) -> &StoreStats {
        &self.store.stats
    }

    /// Deducts inventory and persists sale, receipt and audit entry as one
    /// transaction. See [`SaleRepository::commit`].
    pub async fn commit_sale(&self, sale: &Sale, receipt: &Receipt) -> Result<(), CommitError> {
        self.sales().commit(sale, receipt).await
    }

    /// Moves an issued sale to settled. See [`SaleRepository::settle`].
    pub async fn settle_sale(
        &self,
        sale_id: &str,
        amount_received: Option<Money>,
        user_id: &str,
    ) -> Result<Sale, SettleError> {
        self.sales().settle(sale_id, amount_received, user_id).await
    }

    /// Loads every collection for startup, falling back to `seed` for
    /// empty products, employees and settings.
    pub async fn load_all_collections(&self, seed: &SeedData) -> DbResult<StoreSnapshot> {
        repository::snapshot::load_all(&self.store, seed, Utc::now()).await
    }

    /// Replaces the whole store with `snapshot` in one transaction.
    pub async fn restore(&self, snapshot: &StoreSnapshot, user_id: &str) -> DbResult<()> {
        repository::snapshot::restore(&self.store, snapshot, user_id).await
    }

    /// Empties every collection in one transaction.
    pub async fn clear_all(&self) -> DbResult<()> {
        repository::snapshot::clear_all(&self.store).await
    }

    /// Closes the database connection pool.
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.store.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.store.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use taproom_core::{
        build_sale, PaymentMethod, Product, SaleContext, SaleItem, TaxRate,
    };

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_committed_sale_survives_reopen() {
        let path = std::env::temp_dir().join(format!("taproom-{}.db", uuid::Uuid::new_v4()));
        let seed = SeedData::default();
        let tusker = seed.products[1].clone();

        let sale = {
            let db = Database::new(DbConfig::new(&path)).await.unwrap();
            db.repo::<Product>().put_batch(&seed.products).await.unwrap();

            let ctx = SaleContext::new(PaymentMethod::Cash, "e2", TaxRate::from_bps(1600), Utc::now());
            let sale = build_sale(&[SaleItem::bottle(&tusker, 4).unwrap()], &ctx).unwrap();
            db.commit_sale(&sale, &Receipt::for_sale(&sale, "")).await.unwrap();
            db.close().await;
            sale
        };

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let stored = db.repo::<Sale>().get_by_id(&sale.id).await.unwrap();
        assert_eq!(stored, Some(sale));
        let tusker = db.repo::<Product>().get_by_id("2").await.unwrap().unwrap();
        assert_eq!(tusker.available(), 116);
        db.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
