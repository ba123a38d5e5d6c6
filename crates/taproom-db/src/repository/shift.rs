//! # Shift Repository
//!
//! Day-shift gate transitions. The commit only reads the gate; closing and
//! reopening happen here, each paired with its audit entry in one
//! transaction.
//!
//! ```text
//!   open ──close_day──►  closed      DAY_CLOSE  (warning)
//!   closed ──reopen_day──► open      DAY_REOPEN (critical)
//! ```

use chrono::Utc;
use tracing::{debug, info};

use super::{fetch_doc, upsert_doc, Store};
use crate::error::DbResult;
use taproom_core::validation::validate_day_key;
use taproom_core::{actions, AuditLogEntry, DayShift, Severity};

/// Repository for the per-day gate.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    store: Store,
}

impl ShiftRepository {
    pub(crate) fn new(store: Store) -> Self {
        ShiftRepository { store }
    }

    /// Gate state for `day`. A day with no record is open.
    pub async fn current(&self, day: &str) -> DbResult<DayShift> {
        debug!(day = %day, "Reading day shift");
        let mut conn = self.store.pool.acquire().await?;
        let shift: Option<DayShift> = fetch_doc(&mut conn, &self.store.stats, day).await?;
        Ok(shift.unwrap_or_else(|| DayShift::open(day)))
    }

    /// Closes `day` for sales.
    ///
    /// Closing an already closed day returns it unchanged and writes no
    /// audit entry.
    pub async fn close_day(&self, day: &str, user_id: &str) -> DbResult<DayShift> {
        validate_day_key(day)?;
        let _guard = self.store.writer.lock().await;
        let mut tx = self.store.pool.begin().await?;

        let existing: Option<DayShift> = fetch_doc(&mut tx, &self.store.stats, day).await?;
        if let Some(shift) = existing.filter(|s| s.is_closed) {
            return Ok(shift);
        }

        let now = Utc::now();
        let closed = DayShift::closed(day, now);
        upsert_doc(&mut tx, &closed).await?;
        upsert_doc(
            &mut tx,
            &AuditLogEntry::new(
                actions::DAY_CLOSE,
                format!("Day {} closed", day),
                user_id,
                Severity::Warning,
                now,
            ),
        )
        .await?;

        tx.commit().await?;
        info!(day = %day, user_id = %user_id, "Day closed");
        Ok(closed)
    }

    /// Reopens a closed day so sales can be committed against it again.
    ///
    /// Reopening an open day is a no-op without an audit entry.
    pub async fn reopen_day(&self, day: &str, user_id: &str) -> DbResult<DayShift> {
        validate_day_key(day)?;
        let _guard = self.store.writer.lock().await;
        let mut tx = self.store.pool.begin().await?;

        let existing: Option<DayShift> = fetch_doc(&mut tx, &self.store.stats, day).await?;
        if !existing.is_some_and(|s| s.is_closed) {
            return Ok(DayShift::open(day));
        }

        let opened = DayShift::open(day);
        upsert_doc(&mut tx, &opened).await?;
        upsert_doc(
            &mut tx,
            &AuditLogEntry::new(
                actions::DAY_REOPEN,
                format!("Day {} reopened", day),
                user_id,
                Severity::Critical,
                Utc::now(),
            ),
        )
        .await?;

        tx.commit().await?;
        info!(day = %day, user_id = %user_id, "Day reopened");
        Ok(opened)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use taproom_core::{actions, AuditLogEntry, Severity};

    #[tokio::test]
    async fn test_unknown_day_is_open() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = db.shifts().current("2024-03-01").await.unwrap();
        assert!(!shift.is_closed);
    }

    #[tokio::test]
    async fn test_close_and_reopen_are_audited() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shifts = db.shifts();

        let closed = shifts.close_day("2024-03-01", "e1").await.unwrap();
        assert!(closed.is_closed);
        assert!(closed.closed_at.is_some());
        assert!(shifts.current("2024-03-01").await.unwrap().is_closed);

        // second close is a no-op
        shifts.close_day("2024-03-01", "e1").await.unwrap();

        let reopened = shifts.reopen_day("2024-03-01", "e1").await.unwrap();
        assert!(!reopened.is_closed);
        assert!(!shifts.current("2024-03-01").await.unwrap().is_closed);

        let log = db.repo::<AuditLogEntry>().get_all(None).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, actions::DAY_CLOSE);
        assert_eq!(log[0].severity, Severity::Warning);
        assert_eq!(log[1].action, actions::DAY_REOPEN);
        assert_eq!(log[1].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_bad_day_key_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.shifts().close_day("today", "e1").await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
