//! # Sale Aggregate Verifier
//!
//! Sale-level checks: the submitted totals must match the line items, and
//! the payment split must add up to the sale total.
//!
//! ```text
//! items ──Σ quantity──► == total_quantity ?   else TotalQuantityMismatch
//! items ──Σ line_total► == total_amount   ?   else TotalAmountMismatch
//! cash + card + qr + cheque + due == total_amount ? else PaymentAmountMismatch
//! ```

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::pricing;
use crate::types::{LineItem, Payment};

/// Requires `total_quantity == Σ item.quantity`.
pub fn verify_total_quantity(items: &[LineItem], total_quantity: i64) -> CoreResult<()> {
    let expected = pricing::sale_total_quantity(items);
    if expected != total_quantity {
        return Err(CoreError::TotalQuantityMismatch {
            expected,
            submitted: total_quantity,
        });
    }
    Ok(())
}

/// Requires `total_amount == Σ item.line_total`, scale-insensitively.
pub fn verify_total_amount(items: &[LineItem], total_amount: Decimal) -> CoreResult<()> {
    let expected = pricing::sale_total_amount(items)?;
    if !money::equal_value(expected, total_amount) {
        return Err(CoreError::TotalAmountMismatch {
            expected,
            submitted: total_amount,
        });
    }
    Ok(())
}

/// Requires the payment components to sum to the sale total.
///
/// A non-zero `due_amount` is an outstanding balance, not an error.
/// Components whose sum overflows are `InvalidInput`.
pub fn verify_payment(total_amount: Decimal, payment: &Payment) -> CoreResult<()> {
    let paid = payment.total().ok_or_else(|| CoreError::overflow("payment"))?;
    if !money::equal_value(total_amount, paid) {
        return Err(CoreError::PaymentAmountMismatch {
            expected: total_amount,
            paid,
        });
    }
    Ok(())
}

/// Totals, then the payment when one is given.
pub fn verify_sale(
    items: &[LineItem],
    total_quantity: i64,
    total_amount: Decimal,
    payment: Option<&Payment>,
) -> CoreResult<()> {
    verify_total_quantity(items, total_quantity)?;
    verify_total_amount(items, total_amount)?;
    if let Some(payment) = payment {
        verify_payment(total_amount, payment)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
