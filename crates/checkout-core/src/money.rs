//! # Money Module
//!
//! Exact, null-safe helpers over arbitrary-precision decimals.
//!
//! ## Why Decimal, and Why Scale-Insensitive?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  THE TRAILING ZERO PROBLEM                                              │
//! │                                                                         │
//! │  A client sends 10.00, the catalogue stores 10.                         │
//! │  Comparing the textual or (mantissa, scale) form says "different".     │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, compared by numeric value               │
//! │    0.1 + 0.2 = 0.3 exactly                                              │
//! │    equal_value(10, 10.00) = true                                        │
//! │    equal_value(10, 10.01) = false                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use checkout_core::money;
//! use rust_decimal::Decimal;
//!
//! let ten = Decimal::new(10, 0);      // 10
//! let ten_00 = Decimal::new(1000, 2); // 10.00
//! assert!(money::equal_value(ten, ten_00));
//!
//! // Missing components count as zero
//! let total = money::sum([Some(ten), None, Some(ten_00)]);
//! assert_eq!(total, Some(Decimal::new(20, 0)));
//!
//! // Overflow is reported, never a panic
//! assert_eq!(money::sum([Some(Decimal::MAX), Some(ten)]), None);
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

use crate::CURRENCY_SCALE;

/// Sums optional amounts, treating `None` as zero.
///
/// A payment with every component missing sums to zero. Returns `None`
/// only when the total leaves the decimal range.
pub fn sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(or_zero(value)))
}

/// True iff `a` and `b` are the same number, whatever their scale.
///
/// `10`, `10.0` and `10.00` are all equal. This is a numeric comparison,
/// never a comparison of the textual form.
#[inline]
pub fn equal_value(a: Decimal, b: Decimal) -> bool {
    a.cmp(&b) == Ordering::Equal
}

/// Scale-insensitive `a <= b`.
#[inline]
pub fn less_or_equal(a: Decimal, b: Decimal) -> bool {
    a.cmp(&b) != Ordering::Greater
}

/// Returns the amount, or zero when absent.
#[inline]
pub fn or_zero(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// Rounds half-up (away from zero on a tie) to the currency scale.
///
/// ## Example
/// ```rust
/// use checkout_core::money::round_currency;
/// use rust_decimal::Decimal;
///
/// let value = Decimal::new(10005, 3); // 10.005
/// assert_eq!(round_currency(value), Decimal::new(1001, 2)); // 10.01
/// ```
#[inline]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Unit Tests
// =============================================================================
