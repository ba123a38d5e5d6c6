//! # Sale Repository
//!
//! The inventory-commit transaction and sale settlement.
//!
//! ## Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    commit(sale, receipt)                                │
//! │                                                                         │
//! │  0. shape check (items, totals, receipt)       ── InvalidSale           │
//! │       │                                                                 │
//! │       ▼  take writer lock, BEGIN                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. shifts[day of sale].isClosed?           ── DayClosed        │   │
//! │  │  2. sales[sale.id] exists?                  ── DuplicateSale    │   │
//! │  │  3. load products of every line             ── ProductNotFound  │   │
//! │  │  4. plan_deductions (check + apply)         ── Insufficient*    │   │
//! │  │  5. write products (one per product)                            │   │
//! │  │     write sale, receipt, SALE_COMPLETE audit                    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← everything or nothing; an early return rolls back            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{doc_exists, fetch_all_docs, fetch_doc, upsert_doc, Store};
use crate::error::{CommitError, DbError, DbResult, SettleError};
use taproom_core::{
    actions, plan_deductions, AuditLogEntry, Collection, DayShift, Money, PaymentMethod, Product,
    Receipt, Sale, SaleStatus, Severity,
};

/// Repository for sale commit and settlement.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    store: Store,
}

impl SaleRepository {
    pub(crate) fn new(store: Store) -> Self {
        SaleRepository { store }
    }

    /// Commits a sale: deducts inventory and persists sale, receipt and
    /// audit entry as one unit.
    ///
    /// Rejections are logged at `warn` and returned; nothing is written for
    /// them.
    pub async fn commit(&self, sale: &Sale, receipt: &Receipt) -> Result<(), CommitError> {
        match self.commit_inner(sale, receipt).await {
            Ok(()) => {
                info!(
                    sale_id = %sale.id,
                    total = %sale.total,
                    items = sale.items.len(),
                    status = ?sale.status,
                    "Sale committed"
                );
                Ok(())
            }
            Err(err) => {
                warn!(sale_id = %sale.id, error = %err, "Sale commit rejected");
                Err(err)
            }
        }
    }

    async fn commit_inner(&self, sale: &Sale, receipt: &Receipt) -> Result<(), CommitError> {
        check_shape(sale, receipt)?;

        let stats = &self.store.stats;
        let _guard = self.store.writer.lock().await;
        let mut tx = self.store.pool.begin().await.map_err(DbError::from)?;

        // 1. Gate
        let day = DayShift::key_for(sale.timestamp);
        let shift: Option<DayShift> = fetch_doc(&mut tx, stats, &day).await?;
        if shift.is_some_and(|s| s.is_closed) {
            return Err(CommitError::DayClosed { day });
        }

        // 2. Ids are never reused
        if doc_exists(&mut tx, Collection::Sales, &sale.id).await? {
            return Err(CommitError::DuplicateSale {
                sale_id: sale.id.clone(),
            });
        }

        // 3. Load every referenced product once
        let mut products: HashMap<String, Product> = HashMap::new();
        for item in &sale.items {
            if products.contains_key(&item.product_id) {
                continue;
            }
            let product: Option<Product> = fetch_doc(&mut tx, stats, &item.product_id).await?;
            match product {
                Some(p) => {
                    products.insert(item.product_id.clone(), p);
                }
                None => {
                    return Err(CommitError::ProductNotFound {
                        product_id: item.product_id.clone(),
                    })
                }
            }
        }

        // 4. Check + apply against a working copy
        let updated = plan_deductions(&products, &sale.items)?;

        // 5. Writes
        for product in &updated {
            debug!(
                product_id = %product.id,
                remaining = product.available(),
                "Deducting inventory"
            );
            upsert_doc(&mut tx, product).await?;
        }
        upsert_doc(&mut tx, sale).await?;
        upsert_doc(&mut tx, receipt).await?;

        let audit = AuditLogEntry::new(
            actions::SALE_COMPLETE,
            format!("Sale {} completed, total {}", sale.id, sale.total),
            &sale.cashier_id,
            Severity::Info,
            Utc::now(),
        );
        upsert_doc(&mut tx, &audit).await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    /// Settles an issued sale. Never touches inventory.
    ///
    /// `amount_received` defaults to the exact total.
    pub async fn settle(
        &self,
        sale_id: &str,
        amount_received: Option<Money>,
        user_id: &str,
    ) -> Result<Sale, SettleError> {
        let _guard = self.store.writer.lock().await;
        let mut tx = self.store.pool.begin().await.map_err(DbError::from)?;

        let sale: Option<Sale> = fetch_doc(&mut tx, &self.store.stats, sale_id).await?;
        let sale = sale.ok_or_else(|| SettleError::SaleNotFound {
            sale_id: sale_id.to_string(),
        })?;

        let now = Utc::now();
        let settled = sale.settle(amount_received, now)?;
        upsert_doc(&mut tx, &settled).await?;

        let audit = AuditLogEntry::new(
            actions::SALE_SETTLED,
            format!(
                "Sale {} settled by {}, received {}",
                settled.id,
                settled.payment_method,
                settled.amount_received.unwrap_or(settled.total)
            ),
            user_id,
            Severity::Info,
            now,
        );
        upsert_doc(&mut tx, &audit).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %settled.id, total = %settled.total, "Sale settled");
        Ok(settled)
    }

    /// Issued sales (open tabs), oldest first.
    pub async fn open_tabs(&self) -> DbResult<Vec<Sale>> {
        let mut conn = self.store.pool.acquire().await?;
        let sales: Vec<Sale> = fetch_all_docs(&mut conn, &self.store.stats, None).await?;
        Ok(sales
            .into_iter()
            .filter(|s| s.status == SaleStatus::Issued)
            .collect())
    }
}

/// Rejects a sale whose stored figures disagree with its lines, before any
/// lock or transaction is taken.
fn check_shape(sale: &Sale, receipt: &Receipt) -> Result<(), CommitError> {
    let invalid = |reason: String| Err(CommitError::InvalidSale { reason });

    if sale.items.is_empty() {
        return invalid("sale has no items".to_string());
    }

    let items_total = Sale::items_total(&sale.items);
    if sale.total != items_total {
        return invalid(format!(
            "total {} does not match line items {}",
            sale.total, items_total
        ));
    }

    if sale.payment_method == PaymentMethod::Split && sale.split_breakdown.is_none() {
        return invalid("split sale has no breakdown".to_string());
    }

    if receipt.sale_id != sale.id {
        return invalid(format!("receipt belongs to sale {}", receipt.sale_id));
    }
    if receipt.total != sale.total {
        return invalid(format!(
            "receipt total {} does not match sale total {}",
            receipt.total, sale.total
        ));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
