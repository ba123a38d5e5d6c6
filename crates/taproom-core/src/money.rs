//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Split payment entered by hand:                                         │
//! │    cash 0.1 + mobile 0.2 = 0.30000000000000004  ❌                       │
//! │    → "split does not match total" for a perfectly valid payment         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    KSH 250.00 is stored as 25000                                        │
//! │    Sums are exact; only VAT rounds, and it rounds explicitly            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taproom_core::money::Money;
//!
//! let price = Money::from_major(250);          // KSH 250.00
//! let line = price.multiply_quantity(3);       // KSH 750.00
//! let total = line + Money::from_minor(5050);  // KSH 800.50
//! assert_eq!(total.minor(), 80050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: variances and change calculations can go negative
/// - **Single field tuple struct**: serialises as a bare integer
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.sellPrice / PourOption.price                                   │
/// │          │                                                              │
/// │          ▼  (snapshotted at add-to-cart)                                │
/// │  SaleItem.price ──► Sale.total ──► Sale.vatAmount                       │
/// │                        │                                                │
/// │                        ├──► SplitBreakdown (must match within 1 unit)   │
/// │                        └──► CashUp expected totals ──► variance         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use taproom_core::money::Money;
    ///
    /// let price = Money::from_minor(25050); // 250.50
    /// assert_eq!(price.minor(), 25050);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// Bar prices are nearly always whole shillings, so this is the
    /// constructor seed data and tests reach for.
    ///
    /// ```rust
    /// use taproom_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(250).minor(), 25000);
    /// assert_eq!(Money::from_major(-5).minor(), -500);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates tax at the given rate, rounding half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// i128 keeps large totals from overflowing the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use taproom_core::money::Money;
    /// use taproom_core::types::TaxRate;
    ///
    /// let total = Money::from_major(750);     // KSH 750.00
    /// let vat = total.calculate_tax(TaxRate::from_bps(1600)); // 16%
    /// assert_eq!(vat.minor(), 12000);          // KSH 120.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_minor = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(tax_minor as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use taproom_core::money::Money;
    ///
    /// let pour = Money::from_major(150);
    /// assert_eq!(pour.multiply_quantity(3).minor(), 45000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering without a currency symbol.
///
/// The currency code lives in the store settings; UI collaborators prefix it.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor_and_major() {
        let money = Money::from_minor(25050);
        assert_eq!(money.minor(), 25050);
        assert_eq!(money.major(), 250);
        assert_eq!(money.minor_part(), 50);

        assert_eq!(Money::from_major(220).minor(), 22000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_minor(25050)), "250.50");
        assert_eq!(format!("{}", Money::from_major(5)), "5.00");
        assert_eq!(format!("{}", Money::from_minor(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((b - a).minor(), -500);
        assert_eq!((-a).minor(), -1000);
        let result: Money = a * 3;
        assert_eq!(result.minor(), 3000);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_major(1), Money::from_major(2), Money::from_minor(50)];
        let by_ref: Money = amounts.iter().sum();
        let by_value: Money = amounts.into_iter().sum();
        assert_eq!(by_ref.minor(), 350);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_vat_at_sixteen_percent() {
        let total = Money::from_major(250);
        let vat = total.calculate_tax(TaxRate::from_bps(1600));
        assert_eq!(vat.minor(), 4000);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.825 -> 0.83
        let amount = Money::from_minor(1000);
        let tax = amount.calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.minor(), 83);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_minor(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().minor(), 100);
    }
}
