//! # Inventory Ledger
//!
//! Pure availability checks and deductions run inside the commit
//! transaction. Nothing here reads or writes storage; the caller hands in
//! the products it loaded and persists what comes back.
//!
//! ## Deduction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items: [Tusker × 2, Whiskey 50ml × 3, Tusker × 3]                      │
//! │                                                                         │
//! │  working copy ◄── products loaded in the transaction                    │
//! │       │                                                                 │
//! │       │  for each line, in cart order:                                  │
//! │       │    check_availability(working[p], line)  ── Err ──► abort       │
//! │       │    working[p] = apply_deduction(working[p], line)               │
//! │       ▼                                                                 │
//! │  [Tusker (stock − 5), Whiskey (level − 150ml)]                          │
//! │   one value per product, first-appearance order                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A later line on the same product is checked against what the earlier
//! lines left, so `available` in an error is the remaining amount at that
//! line, not the stored amount.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{LineKind, Product, ProductKind, SaleItem};

/// Millilitres a drum line draws: `volume × quantity`.
fn requested_ml(product_id: &str, item: &SaleItem) -> CoreResult<i64> {
    let volume = match item.volume {
        Some(v) if v > 0 => v,
        _ => {
            return Err(CoreError::invalid_line(
                product_id,
                "drum pour needs a positive volume",
            ))
        }
    };

    volume
        .checked_mul(item.quantity)
        .ok_or_else(|| CoreError::invalid_line(product_id, "requested volume overflows"))
}

/// Rejects lines that cannot apply to this product at all.
fn check_line_shape(product: &Product, item: &SaleItem) -> CoreResult<()> {
    if item.quantity <= 0 {
        return Err(CoreError::invalid_line(
            &product.id,
            format!("quantity must be positive, got {}", item.quantity),
        ));
    }

    match (&product.kind, item.kind) {
        (ProductKind::Bottle(_), LineKind::Bottle) | (ProductKind::Drum(_), LineKind::DrumPour) => {
            Ok(())
        }
        _ => Err(CoreError::kind_mismatch(
            &product.id,
            item.kind,
            product.kind.category(),
        )),
    }
}

/// Checks that `product` can cover `item`.
///
/// ## Errors
/// - `InsufficientStock` when a bottle line asks for more than `stock`
/// - `InsufficientVolume` when `volume × quantity > currentLevel`
/// - `InvalidLineItem` for a mismatched line type, a pour without volume or
///   a non-positive quantity
pub fn check_availability(product: &Product, item: &SaleItem) -> CoreResult<()> {
    check_line_shape(product, item)?;

    match &product.kind {
        ProductKind::Bottle(b) => {
            if item.quantity > b.stock {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    requested: item.quantity,
                    available: b.stock,
                });
            }
        }
        ProductKind::Drum(d) => {
            let requested = requested_ml(&product.id, item)?;
            if requested > d.current_level {
                return Err(CoreError::InsufficientVolume {
                    product_id: product.id.clone(),
                    requested_ml: requested,
                    available_ml: d.current_level,
                });
            }
        }
    }

    Ok(())
}

/// Returns `product` with the line deducted.
///
/// Never clamps. A result below zero is a `LedgerInvariant` error, which
/// only happens when the caller skipped [`check_availability`].
pub fn apply_deduction(product: &Product, item: &SaleItem) -> CoreResult<Product> {
    check_line_shape(product, item)?;

    let mut updated = product.clone();
    match &mut updated.kind {
        ProductKind::Bottle(b) => {
            let remaining = b.stock - item.quantity;
            if remaining < 0 {
                return Err(CoreError::LedgerInvariant {
                    product_id: product.id.clone(),
                    reason: format!("stock would drop to {}", remaining),
                });
            }
            b.stock = remaining;
        }
        ProductKind::Drum(d) => {
            let remaining = d.current_level - requested_ml(&product.id, item)?;
            if remaining < 0 {
                return Err(CoreError::LedgerInvariant {
                    product_id: product.id.clone(),
                    reason: format!("level would drop to {}ml", remaining),
                });
            }
            d.current_level = remaining;
        }
    }

    Ok(updated)
}

/// Validates and applies every line against a working copy of `products`.
///
/// Returns one updated product per affected product id, ordered by first
/// appearance in `items`. Fail-fast: the first failing line's error is
/// returned and `products` is never touched.
///
/// Every `item.product_id` must be a key of `products`; the commit loads
/// them (and reports `ProductNotFound`) before planning.
pub fn plan_deductions(
    products: &HashMap<String, Product>,
    items: &[SaleItem],
) -> CoreResult<Vec<Product>> {
    let mut order: Vec<&str> = Vec::new();
    let mut working: HashMap<&str, Product> = HashMap::new();

    for item in items {
        let pid = item.product_id.as_str();

        if !working.contains_key(pid) {
            let loaded = products.get(pid).ok_or_else(|| CoreError::LedgerInvariant {
                product_id: item.product_id.clone(),
                reason: "product was not loaded before planning".to_string(),
            })?;
            working.insert(pid, loaded.clone());
            order.push(pid);
        }

        let current = working
            .get(pid)
            .ok_or_else(|| CoreError::LedgerInvariant {
                product_id: item.product_id.clone(),
                reason: "working copy missing".to_string(),
            })?;

        check_availability(current, item)?;
        let next = apply_deduction(current, item)?;
        working.insert(pid, next);
    }

    Ok(order
        .into_iter()
        .filter_map(|pid| working.remove(pid))
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::PourOption;

    fn bottle(id: &str, stock: i64) -> Product {
        Product::bottle(
            id,
            "Tusker Lager",
            Money::from_major(150),
            Money::from_major(220),
            stock,
            2,
        )
    }

    fn drum(id: &str, level: i64) -> Product {
        Product::drum(
            id,
            "Whiskey Drum",
            Money::from_major(15000),
            50_000,
            level,
            vec![
                PourOption {
                    label: "50ml".to_string(),
                    volume: 50,
                    price: Money::from_major(150),
                },
                PourOption {
                    label: "500ml".to_string(),
                    volume: 500,
                    price: Money::from_major(1100),
                },
            ],
            5_000,
        )
    }

    fn stock_of(p: &Product) -> i64 {
        p.available()
    }

    #[test]
    fn test_bottle_deduction() {
        let p = bottle("P1", 5);
        let line = SaleItem::bottle(&p, 3).unwrap();

        assert!(check_availability(&p, &line).is_ok());
        let after = apply_deduction(&p, &line).unwrap();
        assert_eq!(stock_of(&after), 2);
        // input untouched
        assert_eq!(stock_of(&p), 5);
    }

    #[test]
    fn test_insufficient_stock() {
        let p = bottle("P1", 2);
        let line = SaleItem::bottle(&p, 3).unwrap();

        assert_eq!(
            check_availability(&p, &line),
            Err(CoreError::InsufficientStock {
                product_id: "P1".to_string(),
                requested: 3,
                available: 2,
            })
        );
    }

    #[test]
    fn test_insufficient_volume() {
        let d = drum("D1", 400);
        let line = SaleItem::pour(&d, "500ml", 1).unwrap();

        assert_eq!(
            check_availability(&d, &line),
            Err(CoreError::InsufficientVolume {
                product_id: "D1".to_string(),
                requested_ml: 500,
                available_ml: 400,
            })
        );
    }

    #[test]
    fn test_exact_level_drains_to_zero() {
        let d = drum("D1", 500);
        let line = SaleItem::pour(&d, "500ml", 1).unwrap();
        let after = apply_deduction(&d, &line).unwrap();
        assert_eq!(stock_of(&after), 0);
    }

    #[test]
    fn test_deduction_never_clamps() {
        let p = bottle("P1", 1);
        let line = SaleItem::bottle(&p, 2).unwrap();
        assert!(matches!(
            apply_deduction(&p, &line),
            Err(CoreError::LedgerInvariant { .. })
        ));
    }

    #[test]
    fn test_line_kind_mismatch() {
        let p = bottle("P1", 10);
        let d = drum("D1", 1000);
        let mut line = SaleItem::pour(&d, "50ml", 1).unwrap();
        line.product_id = "P1".to_string();

        assert!(matches!(
            check_availability(&p, &line),
            Err(CoreError::InvalidLineItem { .. })
        ));
    }

    #[test]
    fn test_pour_without_volume_rejected() {
        let d = drum("D1", 1000);
        let mut line = SaleItem::pour(&d, "50ml", 1).unwrap();
        line.volume = None;

        assert!(matches!(
            check_availability(&d, &line),
            Err(CoreError::InvalidLineItem { .. })
        ));
    }

    #[test]
    fn test_plan_aggregates_lines_on_same_product() {
        let p = bottle("P1", 10);
        let d = drum("D1", 1000);
        let products: HashMap<_, _> = [p.clone(), d.clone()]
            .into_iter()
            .map(|x| (x.id.clone(), x))
            .collect();

        let items = vec![
            SaleItem::bottle(&p, 2).unwrap(),
            SaleItem::pour(&d, "50ml", 3).unwrap(),
            SaleItem::bottle(&p, 3).unwrap(),
        ];

        let planned = plan_deductions(&products, &items).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].id, "P1");
        assert_eq!(stock_of(&planned[0]), 5);
        assert_eq!(planned[1].id, "D1");
        assert_eq!(stock_of(&planned[1]), 850);
    }

    #[test]
    fn test_plan_checks_cumulative_demand() {
        let p = bottle("P1", 4);
        let products: HashMap<_, _> = [(p.id.clone(), p.clone())].into_iter().collect();
        let items = vec![
            SaleItem::bottle(&p, 3).unwrap(),
            SaleItem::bottle(&p, 2).unwrap(),
        ];

        assert_eq!(
            plan_deductions(&products, &items),
            Err(CoreError::InsufficientStock {
                product_id: "P1".to_string(),
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(stock_of(&products["P1"]), 4);
    }
}
