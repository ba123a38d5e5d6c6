//! # Sale Builder
//!
//! Turns a cart into an immutable candidate [`Sale`]. Pure: no storage, no
//! clock. The timestamp comes in through [`SaleContext`].
//!
//! ## Build Steps
//! ```text
//! cart: [SaleItem...] + SaleContext
//!      │
//!      ├── empty?                  → EmptyCart
//!      ├── > MAX_CART_ITEMS lines? → TooManyItems
//!      ├── each line valid?        → InvalidItem
//!      │
//!      ├── total = Σ price × quantity          (exact)
//!      ├── vat   = total × rate, half-up
//!      │
//!      ├── split: |Σ breakdown − total| > tolerance → SplitMismatch
//!      │
//!      └── settlement
//!            Deferred  → status issued
//!            Immediate → status settled, change computed
//!                        received < total → InsufficientTender
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::BuildError;
use crate::money::Money;
use crate::types::{LineKind, PaymentMethod, Sale, SaleItem, SaleStatus, SplitBreakdown, TaxRate};
use crate::validation::{
    validate_cart_size, validate_identifier, validate_price, validate_quantity,
    validate_volume_ml, ValidationResult,
};
use crate::{DEFAULT_SPLIT_TOLERANCE, MAX_CART_ITEMS};

/// When payment is taken relative to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Tab or table order: committed as `issued`, settled later.
    Deferred,
    /// Paid at the till. `None` means exact tender.
    Immediate { amount_received: Option<Money> },
}

/// Everything about a sale that is not in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleContext {
    pub payment_method: PaymentMethod,
    pub cashier_id: String,
    pub table_number: Option<String>,
    pub vat_rate: TaxRate,
    /// Only read when `payment_method` is `Split`.
    pub split_breakdown: Option<SplitBreakdown>,
    /// Largest accepted |Σ breakdown − total|.
    pub split_tolerance: Money,
    pub timestamp: DateTime<Utc>,
    pub settlement: Settlement,
}

impl SaleContext {
    /// A paid-at-the-till context with the default split tolerance.
    pub fn new(
        payment_method: PaymentMethod,
        cashier_id: impl Into<String>,
        vat_rate: TaxRate,
        timestamp: DateTime<Utc>,
    ) -> Self {
        SaleContext {
            payment_method,
            cashier_id: cashier_id.into(),
            table_number: None,
            vat_rate,
            split_breakdown: None,
            split_tolerance: DEFAULT_SPLIT_TOLERANCE,
            timestamp,
            settlement: Settlement::Immediate {
                amount_received: None,
            },
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table_number = Some(table.into());
        self
    }

    pub fn with_split(mut self, breakdown: SplitBreakdown) -> Self {
        self.split_breakdown = Some(breakdown);
        self
    }

    pub fn with_settlement(mut self, settlement: Settlement) -> Self {
        self.settlement = settlement;
        self
    }

    pub fn with_split_tolerance(mut self, tolerance: Money) -> Self {
        self.split_tolerance = tolerance;
        self
    }
}

fn validate_line(item: &SaleItem) -> ValidationResult<()> {
    validate_identifier("productId", &item.product_id)?;
    validate_quantity(item.quantity)?;
    validate_price("price", item.price)?;
    if item.kind == LineKind::DrumPour {
        validate_volume_ml("volume", item.volume.unwrap_or(0))?;
    }
    Ok(())
}

/// Builds a candidate sale from a cart.
///
/// The returned sale has a fresh UUID and is ready for
/// `Database::commit_sale`. Inventory is not checked here; that happens
/// against the live ledger inside the commit.
pub fn build_sale(cart: &[SaleItem], ctx: &SaleContext) -> Result<Sale, BuildError> {
    if cart.is_empty() {
        return Err(BuildError::EmptyCart);
    }
    if validate_cart_size(cart.len()).is_err() {
        return Err(BuildError::TooManyItems {
            max: MAX_CART_ITEMS,
        });
    }

    for item in cart {
        validate_line(item).map_err(|source| BuildError::InvalidItem {
            line_id: item.id.clone(),
            source,
        })?;
    }

    let total = Sale::items_total(cart);
    let vat_amount = total.calculate_tax(ctx.vat_rate);

    let split_breakdown = match ctx.payment_method {
        PaymentMethod::Split => {
            let breakdown = ctx.split_breakdown.unwrap_or_default();
            let got = breakdown.total();
            if (got - total).abs() > ctx.split_tolerance {
                return Err(BuildError::SplitMismatch {
                    expected: total,
                    got,
                });
            }
            Some(breakdown)
        }
        _ => None,
    };

    let mut sale = Sale {
        id: Uuid::new_v4().to_string(),
        timestamp: ctx.timestamp,
        items: cart.to_vec(),
        total,
        payment_method: ctx.payment_method,
        status: SaleStatus::Issued,
        cashier_id: ctx.cashier_id.clone(),
        table_number: ctx.table_number.clone(),
        split_breakdown,
        vat_amount,
        settled_at: None,
        amount_received: None,
        change_given: None,
    };

    if let Settlement::Immediate { amount_received } = ctx.settlement {
        let received = amount_received.unwrap_or(total);
        if received < total {
            return Err(BuildError::InsufficientTender {
                required: total,
                received,
            });
        }
        sale.status = SaleStatus::Settled;
        sale.settled_at = Some(ctx.timestamp);
        sale.amount_received = Some(received);
        sale.change_given = Some(received - total);
    }

    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::{PourOption, Product};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 20, 30, 0).unwrap()
    }

    fn tusker() -> Product {
        Product::bottle(
            "2",
            "Tusker Lager",
            Money::from_major(150),
            Money::from_major(220),
            120,
            20,
        )
    }

    fn whiskey() -> Product {
        Product::drum(
            "drum-1",
            "Premium Whiskey Drum",
            Money::from_major(15000),
            50_000,
            35_000,
            vec![PourOption {
                label: "50ml".to_string(),
                volume: 50,
                price: Money::from_major(150),
            }],
            5_000,
        )
    }

    fn ctx(method: PaymentMethod) -> SaleContext {
        SaleContext::new(method, "e2", TaxRate::from_bps(1600), now())
    }

    #[test]
    fn test_totals_and_vat() {
        let cart = vec![
            SaleItem::bottle(&tusker(), 3).unwrap(),
            SaleItem::pour(&whiskey(), "50ml", 2).unwrap(),
        ];
        let sale = build_sale(&cart, &ctx(PaymentMethod::Cash)).unwrap();

        assert_eq!(sale.total, Money::from_major(960));
        assert_eq!(sale.vat_amount, Money::from_minor(15360));
        assert_eq!(sale.status, SaleStatus::Settled);
        assert_eq!(sale.settled_at, Some(now()));
        assert_eq!(sale.change_given, Some(Money::zero()));
        assert_eq!(sale.items.len(), 2);
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(
            build_sale(&[], &ctx(PaymentMethod::Cash)),
            Err(BuildError::EmptyCart)
        );
    }

    #[test]
    fn test_split_within_tolerance() {
        let cart = vec![SaleItem::bottle(&tusker(), 1).unwrap()];
        let context = ctx(PaymentMethod::Split).with_split(SplitBreakdown {
            cash: Money::from_major(100),
            mobile_money: Money::from_minor(11950),
            card: Money::zero(),
        });

        let sale = build_sale(&cart, &context).unwrap();
        assert!(sale.split_breakdown.is_some());
    }

    #[test]
    fn test_split_mismatch() {
        let cart = vec![SaleItem::bottle(&tusker(), 1).unwrap()];
        let context = ctx(PaymentMethod::Split).with_split(SplitBreakdown {
            cash: Money::from_major(100),
            mobile_money: Money::from_major(100),
            card: Money::zero(),
        });

        assert_eq!(
            build_sale(&cart, &context),
            Err(BuildError::SplitMismatch {
                expected: Money::from_major(220),
                got: Money::from_major(200),
            })
        );
    }

    #[test]
    fn test_breakdown_dropped_for_single_tender() {
        let cart = vec![SaleItem::bottle(&tusker(), 1).unwrap()];
        let context = ctx(PaymentMethod::Card).with_split(SplitBreakdown::default());
        let sale = build_sale(&cart, &context).unwrap();
        assert!(sale.split_breakdown.is_none());
    }

    #[test]
    fn test_deferred_sale_is_issued() {
        let cart = vec![SaleItem::bottle(&tusker(), 2).unwrap()];
        let context = ctx(PaymentMethod::Cash)
            .with_table("T4")
            .with_settlement(Settlement::Deferred);

        let sale = build_sale(&cart, &context).unwrap();
        assert_eq!(sale.status, SaleStatus::Issued);
        assert_eq!(sale.table_number.as_deref(), Some("T4"));
        assert!(sale.settled_at.is_none());
        assert!(sale.amount_received.is_none());
    }

    #[test]
    fn test_cash_change_and_short_tender() {
        let cart = vec![SaleItem::bottle(&tusker(), 1).unwrap()];

        let paid = ctx(PaymentMethod::Cash).with_settlement(Settlement::Immediate {
            amount_received: Some(Money::from_major(500)),
        });
        let sale = build_sale(&cart, &paid).unwrap();
        assert_eq!(sale.change_given, Some(Money::from_major(280)));

        let short = ctx(PaymentMethod::Cash).with_settlement(Settlement::Immediate {
            amount_received: Some(Money::from_major(200)),
        });
        assert!(matches!(
            build_sale(&cart, &short),
            Err(BuildError::InsufficientTender { .. })
        ));
    }

    #[test]
    fn test_invalid_line_quantity() {
        let mut line = SaleItem::bottle(&tusker(), 1).unwrap();
        line.quantity = 0;

        match build_sale(&[line], &ctx(PaymentMethod::Cash)) {
            Err(BuildError::InvalidItem { line_id, source }) => {
                assert_eq!(line_id, "2");
                assert!(matches!(source, ValidationError::MustBePositive { .. }));
            }
            other => panic!("expected InvalidItem, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_lines() {
        let line = SaleItem::bottle(&tusker(), 1).unwrap();
        let cart = vec![line; MAX_CART_ITEMS + 1];
        assert_eq!(
            build_sale(&cart, &ctx(PaymentMethod::Cash)),
            Err(BuildError::TooManyItems {
                max: MAX_CART_ITEMS
            })
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let cart = vec![SaleItem::bottle(&tusker(), 1).unwrap()];
        let a = build_sale(&cart, &ctx(PaymentMethod::Cash)).unwrap();
        let b = build_sale(&cart, &ctx(PaymentMethod::Cash)).unwrap();
        assert_ne!(a.id, b.id);
    }
}
