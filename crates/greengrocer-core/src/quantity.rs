//! # Quantity Module
//!
//! Order quantities and stock levels in thousandths of a unit.
//!
//! Weighted veggies are sold by the kilogram and customers may ask for
//! 1.5 kg, so quantities cannot be plain integers. One stored unit is a
//! gram for weighted items and a thousandth of a pack/unit/box otherwise.
//! Stock uses the same representation so a stock check is one comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// A quantity of an item, stored as thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Stored units per whole unit.
    pub const MILLI: i64 = 1_000;

    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity of whole units (packs, kilos, boxes).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * Self::MILLI)
    }

    /// Converts a float quantity, rounding to the nearest thousandth.
    ///
    /// Only for interop with clients that send floats; prefer `FromStr`.
    pub fn from_f64(value: f64) -> Self {
        Quantity((value * Self::MILLI as f64).round() as i64)
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// True when the quantity has no fractional part.
    #[inline]
    pub const fn is_whole(&self) -> bool {
        self.0 % Self::MILLI == 0
    }

    /// Subtracts, returning `None` if the result would be negative.
    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        let remaining = self.0.checked_sub(other.0)?;
        (remaining >= 0).then_some(Quantity(remaining))
    }
}

/// Parses decimal strings such as `"2"`, `"1.5"` or `"0.250"` exactly.
///
/// ## Example
/// ```rust
/// use greengrocer_core::quantity::Quantity;
///
/// let q: Quantity = "1.5".parse().unwrap();
/// assert_eq!(q.milli(), 1_500);
/// assert!("1.2345".parse::<Quantity>().is_err());
/// ```
impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "quantity".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("not a number"));
        }
        if frac.len() > 3 {
            return Err(invalid("at most three decimal places"));
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a number"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let frac_milli: i64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<3}", frac).parse().map_err(|_| invalid("not a number"))?
        };

        let milli = whole
            .checked_mul(Self::MILLI)
            .and_then(|w| w.checked_add(frac_milli))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Quantity(if negative { -milli } else { milli }))
    }
}

/// Shows the shortest exact decimal, e.g. `2`, `1.5`, `0.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::MILLI;
        let frac = abs % Self::MILLI;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let frac = format!("{:03}", frac);
            write!(f, "{}{}.{}", sign, whole, frac.trim_end_matches('0'))
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}
