//! # Back-Office Records
//!
//! Everything persisted besides products, sales and receipts: the audit
//! trail, reconciliation records, the day-shift gate, staff, settings and
//! parked carts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::types::{PaymentMethod, SaleItem, TaxRate};

// =============================================================================
// Audit Log
// =============================================================================

/// Action names written by the store.
pub mod actions {
    pub const SALE_COMPLETE: &str = "SALE_COMPLETE";
    pub const SALE_SETTLED: &str = "SALE_SETTLED";
    pub const DAY_CLOSE: &str = "DAY_CLOSE";
    pub const DAY_REOPEN: &str = "DAY_REOPEN";
    pub const STORE_RESTORE: &str = "STORE_RESTORE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One line of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
    pub user_id: String,
    pub severity: Severity,
}

impl AuditLogEntry {
    pub fn new(
        action: &str,
        details: impl Into<String>,
        user_id: impl Into<String>,
        severity: Severity,
        at: DateTime<Utc>,
    ) -> Self {
        AuditLogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: at,
            action: action.to_string(),
            details: details.into(),
            user_id: user_id.into(),
            severity,
        }
    }
}

// =============================================================================
// Tender Totals & Cash-Up
// =============================================================================

/// Amounts per tender type.
///
/// Card and mobile money are separate drawers in the till report, so they
/// never get folded into cash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TenderTotals {
    pub cash: Money,
    pub mobile_money: Money,
    pub card: Money,
}

impl TenderTotals {
    pub fn new(cash: Money, mobile_money: Money, card: Money) -> Self {
        TenderTotals {
            cash,
            mobile_money,
            card,
        }
    }

    pub fn total(&self) -> Money {
        self.cash + self.mobile_money + self.card
    }

    /// Adds an amount to the drawer of a single-tender method.
    ///
    /// `Split` has no drawer of its own; callers add its breakdown instead.
    pub(crate) fn credit(&mut self, method: PaymentMethod, amount: Money) {
        match method {
            PaymentMethod::Cash => self.cash += amount,
            PaymentMethod::MobileMoney => self.mobile_money += amount,
            PaymentMethod::Card => self.card += amount,
            PaymentMethod::Split => {}
        }
    }
}

/// A finalised end-of-shift reconciliation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashUp {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub expected: TenderTotals,
    pub actual: TenderTotals,
    /// actual − expected. Negative means the drawer is short.
    pub variance: Money,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// Day Shift
// =============================================================================

/// Per-day gate record, keyed by the UTC calendar date.
///
/// ```text
///   (absent) ≡ open ──close_day──► closed ──reopen_day──► open
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DayShift {
    /// `YYYY-MM-DD`.
    pub id: String,
    pub is_closed: bool,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl DayShift {
    /// Day key for a timestamp: its UTC date as `YYYY-MM-DD`.
    pub fn key_for(ts: DateTime<Utc>) -> String {
        ts.format("%Y-%m-%d").to_string()
    }

    pub fn open(day: impl Into<String>) -> Self {
        DayShift {
            id: day.into(),
            is_closed: false,
            closed_at: None,
        }
    }

    pub fn closed(day: impl Into<String>, at: DateTime<Utc>) -> Self {
        DayShift {
            id: day.into(),
            is_closed: true,
            closed_at: Some(at),
        }
    }
}

// =============================================================================
// Expenses, Staff, Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Cashier,
    Waiter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    /// Badge number printed on receipts, e.g. `GXY-001`.
    pub company_id: String,
    pub name: String,
    pub role: Role,
    pub pin: String,
}

/// Store-wide settings. A single document with id [`SETTINGS_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub id: String,
    pub store_name: String,
    pub store_phone: String,
    pub store_address: String,
    pub admin_pin: String,
    /// Screens hidden from non-admin staff.
    #[serde(default)]
    pub locked_tabs: Vec<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub boss_email: Option<String>,
    pub currency: String,
    pub vat_rate_bps: u32,
    /// Idle minutes before the till locks.
    pub session_timeout: u32,
}

/// Primary key of the settings singleton.
pub const SETTINGS_ID: &str = "global";

impl AppSettings {
    pub fn vat_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.vat_rate_bps)
    }
}

// =============================================================================
// Suspended Orders & Day Snapshots
// =============================================================================

/// A parked cart. Holds no inventory until it is rung up and committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SuspendedOrder {
    pub id: String,
    /// Tab name, e.g. "Table 4" or the customer's name.
    pub name: String,
    pub items: Vec<SaleItem>,
    pub total: Money,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

/// End-of-day summary written after cash-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    /// Day key, `YYYY-MM-DD`.
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub total_sales: Money,
    pub payment_breakdown: TenderTotals,
    pub total_expenses: Money,
    pub variance: Money,
    pub is_locked: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_key_uses_utc_date() {
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();
        assert_eq!(DayShift::key_for(late), "2024-03-01");

        let early = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(DayShift::key_for(early), "2024-03-02");
    }

    #[test]
    fn test_tender_totals() {
        let mut totals = TenderTotals::default();
        totals.credit(PaymentMethod::Cash, Money::from_major(100));
        totals.credit(PaymentMethod::Card, Money::from_major(50));
        totals.credit(PaymentMethod::Split, Money::from_major(999));
        assert_eq!(totals.total(), Money::from_major(150));
    }

    #[test]
    fn test_audit_entry_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = AuditLogEntry::new(actions::DAY_CLOSE, "closed", "e1", Severity::Warning, at);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "DAY_CLOSE");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["userId"], "e1");
    }
}
