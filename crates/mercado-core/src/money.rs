//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! All monetary values in the system are integer cents (`i64`). The database,
//! calculations and API all use cents; only the UI converts to a display
//! string. Rates (service fee, percentage discounts) are expressed in basis
//! points (1 bps = 0.01%) so that rate math stays in integers too.
//!
//! ## Usage
//! ```rust
//! use mercado_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // Bs 10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                      // Bs 21.98
//! let total = price + Money::from_cents(500);   // Bs 15.99
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos).
///
/// - **i64 (signed)**: refunds and discounts may be negative intermediates
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -Bs 5.50, not -Bs 4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Clamps the value at a minimum of zero.
    ///
    /// Cart totals are never negative: a discount larger than the
    /// subtotal-plus-fees bottoms out at zero rather than producing a credit.
    #[inline]
    pub const fn clamp_at_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Returns the given fraction of this amount, expressed in basis points.
    ///
    /// Uses `(amount * bps + 5000) / 10000` so the result rounds half up,
    /// with i128 widening to prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(20000); // Bs 200.00
    /// let fee = subtotal.portion_bps(200);     // 2% service fee
    /// assert_eq!(fee.cents(), 400);            // Bs 4.00
    /// ```
    pub fn portion_bps(&self, bps: u32) -> Money {
        let portion = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(portion as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let price = Money::from_cents(1000);
    /// let discounted = price.apply_percentage_discount(1500); // 15% off
    /// assert_eq!(discounted.cents(), 850);
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.portion_bps(discount_bps)
    }

    /// Pro-rates this amount: `amount * part / whole`, rounded half up.
    ///
    /// Used for return refunds, where the refund for `part` of `whole`
    /// purchased units is derived from the original (bundle-priced) line
    /// total rather than from the current catalog price.
    pub fn pro_rate(&self, part: i64, whole: i64) -> Money {
        if whole == 0 {
            return Money::zero();
        }
        let scaled = self.0 as i128 * part as i128;
        let half = (whole as i128) / 2;
        Money::from_cents(((scaled + half) / whole as i128) as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for debugging and log output. The frontend formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Bs {}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

/// Default money is zero.
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

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
