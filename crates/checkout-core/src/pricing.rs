//! # Pricing Calculator
//!
//! Discount and total formulas shared by verification, refunds, and any
//! client that wants to precompute what the engine will accept.
//!
//! ## Discount Order (load-bearing)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit_price = 100.00, discount_percent = 10, discount_flat = 5.00      │
//! │                                                                         │
//! │  Step 1: percentage first, rounded half-up to 2 decimals               │
//! │          100.00 × (100 − 10) / 100 = 90.00                             │
//! │                                                                         │
//! │  Step 2: flat discount subtracted from the step 1 result               │
//! │          90.00 − 5.00 = 85.00   ✅                                      │
//! │                                                                         │
//! │  NOT: percentage and flat applied independently to 100.00              │
//! │          100.00 − 10.00 − 5.00 happens to agree here, but with          │
//! │          rounding in play the two orders diverge by a cent             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money;
use crate::types::LineItem;

/// Unit price after the percentage discount, then the flat discount.
///
/// ## Errors
/// `InvalidInput` when `unit_price` or `discount_flat` is absent or
/// negative, when `discount_percent` is outside `0..=100`, or when the
/// arithmetic overflows.
///
/// ## Example
/// ```rust
/// use checkout_core::pricing::discounted_unit_price;
/// use rust_decimal::Decimal;
///
/// let price = discounted_unit_price(Some(Decimal::new(100, 0)), 10, Some(Decimal::new(5, 0)))
///     .unwrap();
/// assert_eq!(price, Decimal::new(8500, 2)); // 85.00
/// ```
pub fn discounted_unit_price(
    unit_price: Option<Decimal>,
    discount_percent: i32,
    discount_flat: Option<Decimal>,
) -> CoreResult<Decimal> {
    let unit_price = unit_price.ok_or_else(|| ValidationError::Required {
        field: "unit_price".to_string(),
    })?;
    let discount_flat = discount_flat.ok_or_else(|| ValidationError::Required {
        field: "discount_flat".to_string(),
    })?;

    if !(0..=100).contains(&discount_percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        }
        .into());
    }
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        }
        .into());
    }
    if discount_flat.is_sign_negative() && !discount_flat.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount_flat".to_string(),
        }
        .into());
    }

    let remaining_percent = Decimal::from(100 - discount_percent);
    let scaled = unit_price
        .checked_mul(remaining_percent)
        .ok_or_else(|| CoreError::overflow("unit_price"))?;
    let percentage_discounted = money::round_currency(scaled / Decimal::ONE_HUNDRED);

    Ok(percentage_discounted - discount_flat)
}

fn times_quantity(unit: Decimal, quantity: i64) -> CoreResult<Decimal> {
    unit.checked_mul(Decimal::from(quantity))
        .ok_or_else(|| CoreError::overflow("line_total"))
}

/// `discounted_unit_price × quantity`.
pub fn line_total(
    unit_price: Option<Decimal>,
    discount_percent: i32,
    discount_flat: Option<Decimal>,
    quantity: i64,
) -> CoreResult<Decimal> {
    let unit = discounted_unit_price(unit_price, discount_percent, discount_flat)?;
    times_quantity(unit, quantity)
}

/// Line total recomputed from a line item's own price and discounts.
pub fn expected_line_total(item: &LineItem) -> CoreResult<Decimal> {
    line_total(
        Some(item.unit_price),
        item.discount_percent,
        Some(item.discount_flat_or_zero()),
        item.quantity,
    )
}

/// Refund owed for returning `quantity` units of a line item.
///
/// Uses the same discounted unit price the sale was charged at.
pub fn refund_amount(item: &LineItem, quantity: i64) -> CoreResult<Decimal> {
    let unit = discounted_unit_price(
        Some(item.unit_price),
        item.discount_percent,
        Some(item.discount_flat_or_zero()),
    )?;
    times_quantity(unit, quantity)
}

/// Σ item.quantity
pub fn sale_total_quantity(items: &[LineItem]) -> i64 {
    items.iter().map(|item| item.quantity).sum()
}

/// Σ item.line_total (as submitted on each item).
pub fn sale_total_amount(items: &[LineItem]) -> CoreResult<Decimal> {
    money::sum(items.iter().map(|item| Some(item.line_total)))
        .ok_or_else(|| CoreError::overflow("total_amount"))
}

// =============================================================================
// Unit Tests
// =============================================================================
