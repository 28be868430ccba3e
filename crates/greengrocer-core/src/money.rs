//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Ten-Thousandths?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  THE CENTS PROBLEM                                                      │
//! │    Corporate total = 3.98 × 0.9 = 3.582                                 │
//! │    In cents that is 358.2 → cannot be stored without rounding           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer ten-thousandths of a dollar                      │
//! │    3.98  → 39_800                                                       │
//! │    3.582 → 35_820  (exact)                                              │
//! │    1.5 kg × $3.99/kg → 59_850 (exact)                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use greengrocer_core::money::Money;
//!
//! let price = Money::from_cents(199); // $1.99
//! let doubled = price * 2;            // $3.98
//! assert_eq!(doubled.scaled(), 39_800);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::quantity::Quantity;

/// Number of stored units per whole currency unit.
pub const SCALE: i64 = 10_000;

/// Stored units per cent.
const UNITS_PER_CENT: i64 = SCALE / 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in ten-thousandths of the currency unit.
///
/// ## Where Money is Used
/// ```text
/// Item.unit_price ──► OrderLine.subtotal (frozen) ──► Order.total()
///                                                        │
///                              Payment.amount ◄──────────┤
///                              Customer.balance ◄────────┘ (account payments)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from raw stored units (1/10000).
    #[inline]
    pub const fn from_scaled(units: i64) -> Self {
        Money(units)
    }

    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use greengrocer_core::money::Money;
    ///
    /// let price = Money::from_cents(399); // $3.99
    /// assert_eq!(price.scaled(), 39_900);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents * UNITS_PER_CENT)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money::from_cents(major * 100 - minor)
        } else {
            Money::from_cents(major * 100 + minor)
        }
    }

    /// Returns the raw stored units.
    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }

    /// Returns the value rounded to whole cents (half away from zero).
    ///
    /// ## Example
    /// ```rust
    /// use greengrocer_core::money::Money;
    ///
    /// assert_eq!(Money::from_scaled(35_820).cents(), 358);
    /// assert_eq!(Money::from_scaled(35_850).cents(), 359);
    /// ```
    pub fn cents(&self) -> i64 {
        round_div(self.0 as i128, UNITS_PER_CENT as i128)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a per-unit price by a (possibly fractional) quantity.
    ///
    /// ## Example
    /// ```rust
    /// use greengrocer_core::money::Money;
    /// use greengrocer_core::quantity::Quantity;
    ///
    /// let per_kilo = Money::from_cents(399);
    /// let line = per_kilo.multiply_quantity(Quantity::from_milli(1_500));
    /// assert_eq!(line.scaled(), 59_850); // $5.985
    /// ```
    pub fn multiply_quantity(&self, qty: Quantity) -> Money {
        let product = self.0 as i128 * qty.milli() as i128;
        Money(round_div(product, Quantity::MILLI as i128))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use greengrocer_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(398);
    /// let discounted = subtotal.apply_percentage_discount(1000);
    /// assert_eq!(discounted.scaled(), 35_820); // $3.582
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        let discount = round_div(self.0 as i128 * discount_bps as i128, 10_000);
        Money(self.0 - discount)
    }

    /// Formats with four decimal places, no currency symbol.
    ///
    /// Used where the sub-cent part matters (ledgers, JSON reports).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{}{}.{:04}", sign, abs / SCALE, abs % SCALE)
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    rounded as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money rounded to cents, e.g. `$3.58`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.cents();
        let sign = if cents < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (cents / 100).abs(), (cents % 100).abs())
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

/// Multiplication by a whole count.
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
