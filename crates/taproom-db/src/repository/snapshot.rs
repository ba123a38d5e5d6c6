//! # Store Snapshot
//!
//! Whole-store load, restore and wipe.
//!
//! ## Bootstrap
//! ```text
//! load_all_collections(seed)
//!      │
//!      ├── products   ── empty? → seed.products
//!      ├── employees  ── empty? → seed.employees
//!      ├── settings   ── empty? → seed.settings
//!      ├── sales, audits         newest first
//!      ├── shifts                every stored day record
//!      ├── current_shift         today's record, or open
//!      └── expenses, cashups, suspended, snapshots   as stored
//! ```
//! The seed fallback is in memory only; the `seed` binary is what writes
//! defaults to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use super::{clear_collection, fetch_all_docs, fetch_doc, upsert_doc, Store};
use crate::error::DbResult;
use taproom_core::{
    actions, AppSettings, AuditLogEntry, CashUp, Collection, DayShift, DaySnapshot, Employee,
    Entity, Expense, Product, Receipt, Sale, SeedData, Severity, SuspendedOrder, SETTINGS_ID,
};

/// Every collection of the store, as handed to the UI at startup and as
/// written by backup/restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub products: Vec<Product>,
    /// Newest first.
    pub sales: Vec<Sale>,
    pub expenses: Vec<Expense>,
    pub cashups: Vec<CashUp>,
    pub employees: Vec<Employee>,
    /// Newest first.
    pub audits: Vec<AuditLogEntry>,
    pub settings: AppSettings,
    /// Every stored day record, closed days included.
    #[serde(default)]
    pub shifts: Vec<DayShift>,
    /// Today's entry from `shifts`, or an open day.
    pub current_shift: DayShift,
    pub suspended: Vec<SuspendedOrder>,
    pub snapshots: Vec<DaySnapshot>,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
}

async fn load_with_fallback<T: Entity>(
    conn: &mut SqliteConnection,
    store: &Store,
    fallback: &[T],
) -> DbResult<Vec<T>> {
    let stored: Vec<T> = fetch_all_docs(conn, &store.stats, None).await?;
    if stored.is_empty() {
        warn!(collection = %T::COLLECTION, "Collection empty, using seed defaults");
        return Ok(fallback.to_vec());
    }
    Ok(stored)
}

pub(crate) async fn load_all(store: &Store, seed: &SeedData, now: DateTime<Utc>) -> DbResult<StoreSnapshot> {
    // One read transaction so the snapshot is consistent.
    let mut tx = store.pool.begin().await?;

    let products = load_with_fallback(&mut tx, store, &seed.products).await?;
    let employees = load_with_fallback(&mut tx, store, &seed.employees).await?;
    let settings: Option<AppSettings> = fetch_doc(&mut tx, &store.stats, SETTINGS_ID).await?;
    let settings = settings.unwrap_or_else(|| seed.settings.clone());

    let mut sales: Vec<Sale> = fetch_all_docs(&mut tx, &store.stats, None).await?;
    sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut audits: Vec<AuditLogEntry> = fetch_all_docs(&mut tx, &store.stats, None).await?;
    audits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let shifts: Vec<DayShift> = fetch_all_docs(&mut tx, &store.stats, None).await?;
    let today = DayShift::key_for(now);
    let current_shift = shifts
        .iter()
        .find(|s| s.id == today)
        .cloned()
        .unwrap_or_else(|| DayShift::open(today));

    let snapshot = StoreSnapshot {
        products,
        sales,
        expenses: fetch_all_docs(&mut tx, &store.stats, None).await?,
        cashups: fetch_all_docs(&mut tx, &store.stats, None).await?,
        employees,
        audits,
        settings,
        shifts,
        current_shift,
        suspended: fetch_all_docs(&mut tx, &store.stats, None).await?,
        snapshots: fetch_all_docs(&mut tx, &store.stats, None).await?,
        receipts: fetch_all_docs(&mut tx, &store.stats, None).await?,
    };

    tx.commit().await?;

    info!(
        products = snapshot.products.len(),
        sales = snapshot.sales.len(),
        audits = snapshot.audits.len(),
        "Store loaded"
    );
    Ok(snapshot)
}

async fn put_all<T: Entity>(conn: &mut SqliteConnection, entities: &[T]) -> DbResult<()> {
    for entity in entities {
        upsert_doc(&mut *conn, entity).await?;
    }
    Ok(())
}

async fn clear_every_collection(conn: &mut SqliteConnection) -> DbResult<()> {
    for collection in Collection::ALL {
        clear_collection(&mut *conn, collection).await?;
    }
    Ok(())
}

/// Replaces the whole store with `snapshot`, then appends a STORE_RESTORE
/// entry. One transaction: a bad document leaves the old store intact.
pub(crate) async fn restore(store: &Store, snapshot: &StoreSnapshot, user_id: &str) -> DbResult<()> {
    let _guard = store.writer.lock().await;
    let mut tx = store.pool.begin().await?;

    clear_every_collection(&mut tx).await?;

    put_all(&mut tx, &snapshot.products).await?;
    put_all(&mut tx, &snapshot.employees).await?;
    upsert_doc(&mut tx, &snapshot.settings).await?;
    put_all(&mut tx, &snapshot.shifts).await?;
    // Older backups carry only today's record.
    if !snapshot.shifts.iter().any(|s| s.id == snapshot.current_shift.id) {
        upsert_doc(&mut tx, &snapshot.current_shift).await?;
    }
    put_all(&mut tx, &snapshot.expenses).await?;
    put_all(&mut tx, &snapshot.cashups).await?;
    put_all(&mut tx, &snapshot.suspended).await?;
    put_all(&mut tx, &snapshot.snapshots).await?;
    put_all(&mut tx, &snapshot.receipts).await?;

    // Stored oldest first so rowid order stays chronological.
    let mut sales: Vec<&Sale> = snapshot.sales.iter().collect();
    sales.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    for sale in sales {
        upsert_doc(&mut tx, sale).await?;
    }
    let mut audits: Vec<&AuditLogEntry> = snapshot.audits.iter().collect();
    audits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    for audit in audits {
        upsert_doc(&mut tx, audit).await?;
    }

    let entry = AuditLogEntry::new(
        actions::STORE_RESTORE,
        format!(
            "Store restored: {} products, {} sales",
            snapshot.products.len(),
            snapshot.sales.len()
        ),
        user_id,
        Severity::Critical,
        Utc::now(),
    );
    upsert_doc(&mut tx, &entry).await?;

    tx.commit().await?;
    warn!(user_id = %user_id, "Store restored from snapshot");
    Ok(())
}

/// Empties every collection in one transaction.
pub(crate) async fn clear_all(store: &Store) -> DbResult<()> {
    let _guard = store.writer.lock().await;
    let mut tx = store.pool.begin().await?;
    clear_every_collection(&mut tx).await?;
    tx.commit().await?;
    warn!("All collections cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::error::{CommitError, DbError};
    use crate::pool::{Database, DbConfig};
    use taproom_core::{
        actions, build_sale, AuditLogEntry, DayShift, PaymentMethod, Product, Receipt, Sale,
        SaleContext, SaleItem, SeedData, TaxRate,
    };

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_falls_back_to_seed() {
        let db = setup().await;
        let seed = SeedData::default();

        let snapshot = db.load_all_collections(&seed).await.unwrap();
        assert_eq!(snapshot.products, seed.products);
        assert_eq!(snapshot.employees, seed.employees);
        assert_eq!(snapshot.settings, seed.settings);
        assert!(snapshot.sales.is_empty());
        assert!(!snapshot.current_shift.is_closed);

        // fallback is not persisted
        assert_eq!(db.repo::<Product>().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sales_newest_first() {
        let db = setup().await;
        let seed = SeedData::default();
        db.repo::<Product>().put_batch(&seed.products).await.unwrap();

        let now = Utc::now();
        let mut ids = Vec::new();
        for minutes in [30, 10, 20] {
            let ctx = SaleContext::new(
                PaymentMethod::Cash,
                "e2",
                TaxRate::from_bps(1600),
                now - Duration::minutes(minutes),
            );
            let line = SaleItem::bottle(&seed.products[0], 1).unwrap();
            let sale = build_sale(&[line], &ctx).unwrap();
            db.commit_sale(&sale, &Receipt::for_sale(&sale, "")).await.unwrap();
            ids.push(sale.id);
        }

        let snapshot = db.load_all_collections(&seed).await.unwrap();
        let order: Vec<_> = snapshot.sales.iter().map(|s| s.id.clone()).collect();
        assert_eq!(order, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        assert_eq!(snapshot.products[0].available(), 42);
    }

    #[tokio::test]
    async fn test_restore_replaces_everything() {
        let db = setup().await;
        let seed = SeedData::default();
        db.repo::<Product>().put_batch(&seed.products).await.unwrap();

        let mut snapshot = db.load_all_collections(&seed).await.unwrap();
        snapshot.products.truncate(1);
        db.restore(&snapshot, "e1").await.unwrap();

        assert_eq!(db.repo::<Product>().count().await.unwrap(), 1);
        let log = db.repo::<AuditLogEntry>().get_all(None).await.unwrap();
        assert_eq!(log.last().unwrap().action, actions::STORE_RESTORE);
    }

    #[tokio::test]
    async fn test_restore_keeps_closed_days_closed() {
        let db = setup().await;
        let seed = SeedData::default();
        db.repo::<Product>().put_batch(&seed.products).await.unwrap();
        db.shifts().close_day("2024-03-01", "e1").await.unwrap();

        let snapshot = db.load_all_collections(&seed).await.unwrap();
        assert_eq!(snapshot.shifts.len(), 1);
        assert!(snapshot.shifts[0].is_closed);

        db.restore(&snapshot, "e1").await.unwrap();
        assert!(db.shifts().current("2024-03-01").await.unwrap().is_closed);

        let log = db.repo::<AuditLogEntry>().get_all(None).await.unwrap();
        assert!(log.iter().all(|a| a.action != actions::DAY_REOPEN));

        let at = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let ctx = SaleContext::new(PaymentMethod::Cash, "e2", TaxRate::from_bps(1600), at);
        let sale = build_sale(&[SaleItem::bottle(&seed.products[0], 1).unwrap()], &ctx).unwrap();
        let err = db
            .commit_sale(&sale, &Receipt::for_sale(&sale, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::DayClosed { .. }));
    }

    #[tokio::test]
    async fn test_restore_older_backup_without_shifts() {
        let db = setup().await;
        let seed = SeedData::default();
        db.repo::<Product>().put_batch(&seed.products).await.unwrap();

        let mut snapshot = db.load_all_collections(&seed).await.unwrap();
        snapshot.shifts.clear();
        db.restore(&snapshot, "e1").await.unwrap();

        let today = snapshot.current_shift.id.clone();
        assert!(db.repo::<DayShift>().get_by_id(&today).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restore_with_bad_product_keeps_old_store() {
        let db = setup().await;
        let seed = SeedData::default();
        db.repo::<Product>().put_batch(&seed.products).await.unwrap();

        let mut snapshot = db.load_all_collections(&seed).await.unwrap();
        snapshot.products[0].name = String::new();

        let err = db.restore(&snapshot, "e1").await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(db.repo::<Product>().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let db = setup().await;
        let seed = SeedData::default();
        db.repo::<Product>().put_batch(&seed.products).await.unwrap();
        db.shifts().close_day("2024-03-01", "e1").await.unwrap();

        db.clear_all().await.unwrap();

        assert_eq!(db.repo::<Product>().count().await.unwrap(), 0);
        assert_eq!(db.repo::<AuditLogEntry>().count().await.unwrap(), 0);
        assert_eq!(db.repo::<Sale>().count().await.unwrap(), 0);
        assert!(!db.shifts().current("2024-03-01").await.unwrap().is_closed);
    }
}
