//! # Cash-Up Calculator
//!
//! Expected-vs-counted reconciliation over settled sales. Read-only: it
//! never changes a sale or a product.
//!
//! ## Shift Window
//! ```text
//!   last cash-up                                      now
//!        │◄──────────────── window ──────────────────►│
//!        │   settled sales with effective_time > since │
//!        │                                             │
//!        │   cash   ──► expected.cash                  │
//!        │   card   ──► expected.card                  │
//!        │   mpesa  ──► expected.mobile_money          │
//!        │   split  ──► each breakdown component       │
//! ```
//! Issued (unpaid) sales are left out: no money has changed hands yet.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::money::Money;
use crate::records::{CashUp, DayShift, DaySnapshot, Expense, TenderTotals};
use crate::types::{PaymentMethod, Sale};

/// Expected drawer totals for one shift window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashUpCandidate {
    /// Exclusive lower bound of the window; `None` covers all history.
    pub since: Option<DateTime<Utc>>,
    pub expected: TenderTotals,
    /// Settled sales counted in `expected`.
    pub sale_count: usize,
}

impl CashUpCandidate {
    pub fn from_sales(sales: &[Sale], since: Option<DateTime<Utc>>) -> Self {
        let mut expected = TenderTotals::default();
        let mut sale_count = 0;

        let in_window = sales
            .iter()
            .filter(|s| s.is_settled())
            .filter(|s| since.map_or(true, |t| s.effective_time() > t));

        for sale in in_window {
            sale_count += 1;
            match (sale.payment_method, sale.split_breakdown) {
                (PaymentMethod::Split, Some(split)) => {
                    expected.cash += split.cash;
                    expected.mobile_money += split.mobile_money;
                    expected.card += split.card;
                }
                // A split sale stored without its breakdown has no drawer to
                // credit; it still counts toward sale_count.
                (PaymentMethod::Split, None) => {}
                (method, _) => expected.credit(method, sale.total),
            }
        }

        CashUpCandidate {
            since,
            expected,
            sale_count,
        }
    }

    /// Records the counted amounts. `variance = actual − expected`.
    pub fn finalize(
        &self,
        actual: TenderTotals,
        notes: impl Into<String>,
        at: DateTime<Utc>,
    ) -> CashUp {
        CashUp {
            id: Uuid::new_v4().to_string(),
            timestamp: at,
            expected: self.expected,
            actual,
            variance: actual.total() - self.expected.total(),
            notes: notes.into(),
        }
    }
}

/// Timestamp of the most recent cash-up, the start of the next window.
pub fn last_cash_up_time(cashups: &[CashUp]) -> Option<DateTime<Utc>> {
    cashups.iter().map(|c| c.timestamp).max()
}

impl DaySnapshot {
    /// End-of-day summary for `day` (`YYYY-MM-DD`).
    ///
    /// Counts settled sales and expenses whose timestamps fall on that UTC
    /// date. The snapshot is written locked.
    pub fn summarize(
        day: &str,
        sales: &[Sale],
        expenses: &[Expense],
        variance: Money,
        at: DateTime<Utc>,
    ) -> DaySnapshot {
        let todays: Vec<Sale> = sales
            .iter()
            .filter(|s| DayShift::key_for(s.effective_time()) == day)
            .cloned()
            .collect();
        let candidate = CashUpCandidate::from_sales(&todays, None);

        let total_expenses = expenses
            .iter()
            .filter(|e| DayShift::key_for(e.date) == day)
            .map(|e| e.amount)
            .sum();

        DaySnapshot {
            id: day.to_string(),
            timestamp: at,
            total_sales: candidate.expected.total(),
            payment_breakdown: candidate.expected,
            total_expenses,
            variance,
            is_locked: true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SaleStatus, SplitBreakdown};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()
    }

    fn sale(id: &str, method: PaymentMethod, major: i64, at: DateTime<Utc>) -> Sale {
        Sale {
            id: id.to_string(),
            timestamp: at,
            items: Vec::new(),
            total: Money::from_major(major),
            payment_method: method,
            status: SaleStatus::Settled,
            cashier_id: "e2".to_string(),
            table_number: None,
            split_breakdown: None,
            vat_amount: Money::zero(),
            settled_at: Some(at),
            amount_received: Some(Money::from_major(major)),
            change_given: Some(Money::zero()),
        }
    }

    #[test]
    fn test_expected_per_tender() {
        let mut split = sale("s4", PaymentMethod::Split, 300, t0());
        split.split_breakdown = Some(SplitBreakdown {
            cash: Money::from_major(100),
            mobile_money: Money::from_major(150),
            card: Money::from_major(50),
        });

        let sales = vec![
            sale("s1", PaymentMethod::Cash, 220, t0()),
            sale("s2", PaymentMethod::MobileMoney, 500, t0()),
            sale("s3", PaymentMethod::Card, 1000, t0()),
            split,
        ];

        let candidate = CashUpCandidate::from_sales(&sales, None);
        assert_eq!(candidate.sale_count, 4);
        assert_eq!(candidate.expected.cash, Money::from_major(320));
        assert_eq!(candidate.expected.mobile_money, Money::from_major(650));
        assert_eq!(candidate.expected.card, Money::from_major(1050));
    }

    #[test]
    fn test_window_and_unsettled_excluded() {
        let since = t0();
        let mut issued = sale("s3", PaymentMethod::Cash, 900, since + Duration::hours(1));
        issued.status = SaleStatus::Issued;
        issued.settled_at = None;

        let sales = vec![
            sale("s1", PaymentMethod::Cash, 220, since - Duration::minutes(5)),
            sale("s2", PaymentMethod::Cash, 250, since + Duration::minutes(5)),
            issued,
        ];

        let candidate = CashUpCandidate::from_sales(&sales, Some(since));
        assert_eq!(candidate.sale_count, 1);
        assert_eq!(candidate.expected.cash, Money::from_major(250));
    }

    #[test]
    fn test_tab_settled_after_cash_up_counts_in_next_window() {
        let since = t0();
        let mut tab = sale("tab", PaymentMethod::Cash, 440, since - Duration::hours(2));
        tab.settled_at = Some(since + Duration::minutes(30));

        let candidate = CashUpCandidate::from_sales(&[tab], Some(since));
        assert_eq!(candidate.expected.cash, Money::from_major(440));
    }

    #[test]
    fn test_variance_is_signed() {
        let sales = vec![sale("s1", PaymentMethod::Cash, 1000, t0())];
        let candidate = CashUpCandidate::from_sales(&sales, None);

        let short = candidate.finalize(
            TenderTotals::new(Money::from_major(950), Money::zero(), Money::zero()),
            "till short",
            t0(),
        );
        assert_eq!(short.variance, Money::from_major(-50));

        let over = candidate.finalize(
            TenderTotals::new(Money::from_major(1010), Money::zero(), Money::zero()),
            "",
            t0(),
        );
        assert_eq!(over.variance, Money::from_major(10));
    }

    #[test]
    fn test_last_cash_up_time() {
        assert_eq!(last_cash_up_time(&[]), None);

        let candidate = CashUpCandidate::from_sales(&[], None);
        let a = candidate.finalize(TenderTotals::default(), "", t0());
        let b = candidate.finalize(TenderTotals::default(), "", t0() + Duration::hours(8));
        assert_eq!(last_cash_up_time(&[b, a]), Some(t0() + Duration::hours(8)));
    }

    #[test]
    fn test_day_snapshot() {
        let sales = vec![
            sale("s1", PaymentMethod::Cash, 220, t0()),
            sale("s2", PaymentMethod::Card, 500, t0() + Duration::days(1)),
        ];
        let expenses = vec![Expense {
            id: "x1".to_string(),
            date: t0(),
            description: "Ice".to_string(),
            category: "supplies".to_string(),
            amount: Money::from_major(80),
        }];

        let snap = DaySnapshot::summarize("2024-03-01", &sales, &expenses, Money::zero(), t0());
        assert_eq!(snap.total_sales, Money::from_major(220));
        assert_eq!(snap.total_expenses, Money::from_major(80));
        assert!(snap.is_locked);
    }
}
