//! # Repository Module
//!
//! Collection storage for Taproom POS.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One table per collection, same shape everywhere:                       │
//! │                                                                         │
//! │   products          ┌──────────┬─────────────────────┬──────────────┐   │
//! │   sales             │ id (PK)  │ body (JSON doc)     │ updated_at   │   │
//! │   receipts          ├──────────┼─────────────────────┼──────────────┤   │
//! │   audit_logs        │ "2"      │ {"name":"Tusker"..} │ 2024-03-01.. │   │
//! │   shifts            │ "drum-1" │ {"category":"drum"} │ 2024-03-01.. │   │
//! │   ...               └──────────┴─────────────────────┴──────────────┘   │
//! │                                                                         │
//! │  Repository<T: Entity>                                                  │
//! │  ├── get_all(limit)      rowid order = insertion order                  │
//! │  ├── get_by_id(id)                                                      │
//! │  ├── put(entity)         upsert, keeps the original rowid               │
//! │  ├── put_batch(entities) one transaction                                │
//! │  ├── delete(id)                                                         │
//! │  └── count()                                                            │
//! │                                                                         │
//! │  Multi-collection operations (commit, settle, shift gate, restore)      │
//! │  live in the sibling modules and share the doc helpers below.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writer Lock
//! Every write path holds `Store::writer` for its whole transaction. Two
//! commits on the same product therefore never read the same stock level.
//!
//! ## Available Repositories
//!
//! - [`Repository`] - Generic per-collection CRUD
//! - [`SaleRepository`] - Inventory commit and settlement
//! - [`ShiftRepository`] - Day-shift gate transitions

pub mod sale;
pub mod shift;
pub mod snapshot;

pub use sale::SaleRepository;
pub use shift::ShiftRepository;
pub use snapshot::StoreSnapshot;

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::DbResult;
use taproom_core::{Collection, Entity};

// =============================================================================
// Shared Store Handle
// =============================================================================

/// Per-collection read counters.
///
/// Counts documents fetched by id plus `get_all` scans. Exposed through
/// `Database::stats()` for diagnostics and tests.
#[derive(Debug, Default)]
pub struct StoreStats {
    reads: [AtomicU64; Collection::ALL.len()],
}

impl StoreStats {
    /// Reads recorded against `collection` since the store was opened.
    pub fn reads(&self, collection: Collection) -> u64 {
        self.reads[collection.index()].load(Ordering::Relaxed)
    }

    pub(crate) fn record_read(&self, collection: Collection) {
        self.reads[collection.index()].fetch_add(1, Ordering::Relaxed);
    }
}

/// Pool, writer lock and stats shared by every repository.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    pub(crate) pool: SqlitePool,
    pub(crate) writer: Arc<Mutex<()>>,
    pub(crate) stats: Arc<StoreStats>,
}

impl Store {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Store {
            pool,
            writer: Arc::new(Mutex::new(())),
            stats: Arc::new(StoreStats::default()),
        }
    }
}

// =============================================================================
// Document Helpers
// =============================================================================
// Run on any connection: a pooled one for plain reads, or `&mut *tx` inside a
// transaction. Table names come from `Collection`, never from input.

pub(crate) async fn fetch_doc<T: Entity>(
    conn: &mut SqliteConnection,
    stats: &StoreStats,
    id: &str,
) -> DbResult<Option<T>> {
    let sql = format!(
        "SELECT body FROM {} WHERE id = ?1",
        T::COLLECTION.table_name()
    );
    stats.record_read(T::COLLECTION);

    let body: Option<String> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match body {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub(crate) async fn fetch_all_docs<T: Entity>(
    conn: &mut SqliteConnection,
    stats: &StoreStats,
    limit: Option<usize>,
) -> DbResult<Vec<T>> {
    // LIMIT -1 means no limit in SQLite.
    let sql = format!(
        "SELECT body FROM {} ORDER BY rowid LIMIT ?1",
        T::COLLECTION.table_name()
    );
    let limit = limit.map_or(-1, |n| n as i64);
    stats.record_read(T::COLLECTION);

    let bodies: Vec<String> = sqlx::query_scalar(&sql)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

    bodies
        .iter()
        .map(|json| Ok(serde_json::from_str::<T>(json)?))
        .collect()
}

/// Validates and upserts one document.
pub(crate) async fn upsert_doc<T: Entity>(conn: &mut SqliteConnection, entity: &T) -> DbResult<()> {
    entity.validate()?;

    let sql = format!(
        r#"
        INSERT INTO {} (id, body, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
        "#,
        T::COLLECTION.table_name()
    );
    let body = serde_json::to_string(entity)?;

    sqlx::query(&sql)
        .bind(entity.id())
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub(crate) async fn doc_exists(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> DbResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
        collection.table_name()
    );
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

pub(crate) async fn delete_doc(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> DbResult<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", collection.table_name());
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn clear_collection(
    conn: &mut SqliteConnection,
    collection: Collection,
) -> DbResult<()> {
    let sql = format!("DELETE FROM {}", collection.table_name());
    sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(())
}

// =============================================================================
// Generic Repository
// =============================================================================

/// CRUD over one collection.
///
/// ## Example
/// ```rust,ignore
/// let products = db.repo::<Product>().get_all(None).await?;
/// db.repo::<Expense>().put(&expense).await?;
/// ```
pub struct Repository<T> {
    store: Store,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &T::COLLECTION)
            .finish()
    }
}

impl<T: Entity> Repository<T> {
    pub(crate) fn new(store: Store) -> Self {
        Repository {
            store,
            _entity: PhantomData,
        }
    }

    /// All documents in insertion order, optionally capped at `limit`.
    pub async fn get_all(&self, limit: Option<usize>) -> DbResult<Vec<T>> {
        debug!(collection = %T::COLLECTION, ?limit, "Loading collection");
        let mut conn = self.store.pool.acquire().await?;
        fetch_all_docs(&mut conn, &self.store.stats, limit).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<T>> {
        debug!(collection = %T::COLLECTION, id = %id, "Getting document");
        let mut conn = self.store.pool.acquire().await?;
        fetch_doc(&mut conn, &self.store.stats, id).await
    }

    /// Inserts or replaces by primary key.
    pub async fn put(&self, entity: &T) -> DbResult<()> {
        debug!(collection = %T::COLLECTION, id = %entity.id(), "Putting document");
        let _guard = self.store.writer.lock().await;
        let mut conn = self.store.pool.acquire().await?;
        upsert_doc(&mut conn, entity).await
    }

    /// Upserts every entity in one transaction. All or nothing.
    pub async fn put_batch(&self, entities: &[T]) -> DbResult<()> {
        debug!(collection = %T::COLLECTION, count = entities.len(), "Putting batch");
        let _guard = self.store.writer.lock().await;
        let mut tx = self.store.pool.begin().await?;

        for entity in entities {
            upsert_doc(&mut tx, entity).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Removes a document. Returns `false` when it was not there.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(collection = %T::COLLECTION, id = %id, "Deleting document");
        let _guard = self.store.writer.lock().await;
        let mut conn = self.store.pool.acquire().await?;
        delete_doc(&mut conn, T::COLLECTION, id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::COLLECTION.table_name());
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.store.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
