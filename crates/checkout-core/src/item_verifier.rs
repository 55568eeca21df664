//! # Line Item Verifier
//!
//! Checks a submitted line item against the authoritative product record.
//!
//! ## Check Order (fail-fast per item)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submitted item + product (by id) + product (by code)                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. is_active          deleted/disabled under EITHER id? → reject      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  2. verify_unit_price  product.price == item.unit_price ?              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  3. verify_discount    min_price <= discounted unit price ?            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  4. verify_line_total  item.line_total == recomputed line total ?      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │      ✅ item accepted                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is read-only. Collecting failures across items is
//! the orchestrator's job.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money;
use crate::pricing;
use crate::request::LineItemRequest;
use crate::types::Product;

/// Fails with `ProductNotActive` if either record is deleted or disabled.
///
/// The record found by surrogate id and the one found by product code are
/// normally the same product. When they are not, the stricter answer wins.
pub fn is_active(by_id: &Product, by_code: &Product) -> CoreResult<()> {
    let deleted = by_id.deleted || by_code.deleted;
    let disabled = !by_id.enabled || !by_code.enabled;

    if deleted || disabled {
        return Err(CoreError::ProductNotActive {
            product_id: by_id.id.clone(),
        });
    }
    Ok(())
}

/// Requires the submitted unit price to equal the product price.
///
/// Returns the submitted price on success.
pub fn verify_unit_price(product: &Product, item: &LineItemRequest) -> CoreResult<Decimal> {
    let submitted = item.unit_price.ok_or_else(|| ValidationError::Required {
        field: "unit_price".to_string(),
    })?;

    if !money::equal_value(product.price, submitted) {
        return Err(CoreError::UnitPriceMismatch {
            product_id: product.id.clone(),
            expected: product.price,
            submitted,
        });
    }
    Ok(submitted)
}

/// Requires the discounted unit price to stay at or above `min_price`.
///
/// Runs [`verify_unit_price`] first.
pub fn verify_discount(product: &Product, item: &LineItemRequest) -> CoreResult<Decimal> {
    let unit_price = verify_unit_price(product, item)?;
    let discounted = pricing::discounted_unit_price(
        Some(unit_price),
        item.discount_percent,
        Some(item.discount_flat_or_zero()),
    )?;

    if !money::less_or_equal(product.min_price, discounted) {
        return Err(CoreError::DiscountMismatch {
            product_id: product.id.clone(),
            min_price: product.min_price,
            discounted,
        });
    }
    Ok(discounted)
}

/// Requires the submitted line total to equal the recomputed one.
pub fn verify_line_total(item: &LineItemRequest) -> CoreResult<()> {
    let submitted = item.line_total.ok_or_else(|| ValidationError::Required {
        field: "line_total".to_string(),
    })?;
    let expected = pricing::line_total(
        item.unit_price,
        item.discount_percent,
        Some(item.discount_flat_or_zero()),
        item.quantity,
    )?;

    if !money::equal_value(expected, submitted) {
        return Err(CoreError::TotalAmountMismatch {
            expected,
            submitted,
        });
    }
    Ok(())
}

/// All item checks, stopping at the first failure.
pub fn verify_line_item(
    by_id: &Product,
    by_code: &Product,
    item: &LineItemRequest,
) -> CoreResult<()> {
    is_active(by_id, by_code)?;
    verify_discount(by_id, item)?;
    verify_line_total(item)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::test_support::product;
    use rust_decimal_macros::dec;

    fn request(unit_price: Decimal, percent: i32, flat: Option<Decimal>, qty: i64, total: Decimal) -> LineItemRequest {
        LineItemRequest {
            product_id: "P-1".to_string(),
            quantity: qty,
            unit_price: Some(unit_price),
            discount_percent: percent,
            discount_flat: flat,
            line_total: Some(total),
        }
    }

    #[test]
    fn test_accepts_consistent_item() {
        let p = product("P-1", dec!(500.00), dec!(400.00));
        let item = request(dec!(500), 10, Some(dec!(20.00)), 3, dec!(1290.00));
        assert!(verify_line_item(&p, &p, &item).is_ok());
    }

    #[test]
    fn test_wrong_line_total_scenario() {
        let p = product("P-1", dec!(500.00), dec!(400.00));
        let item = request(dec!(500.00), 10, Some(dec!(20.00)), 3, dec!(1280.00));
        let err = verify_line_item(&p, &p, &item).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TotalAmountMismatch);
    }

    #[test]
    fn test_unit_price_mismatch() {
        let p = product("P-1", dec!(10.00), dec!(5));
        let item = request(dec!(9.99), 0, None, 1, dec!(9.99));
        let err = verify_line_item(&p, &p, &item).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnitPriceMismatch);
    }

    #[test]
    fn test_discount_below_min_price() {
        let p = product("P-1", dec!(100.00), dec!(80.00));
        // 100 × 0.90 − 15 = 75 < 80
        let item = request(dec!(100), 10, Some(dec!(15)), 1, dec!(75));
        let err = verify_discount(&p, &item).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscountMismatch);

        // Exactly at the floor is fine
        let item = request(dec!(100), 10, Some(dec!(10)), 1, dec!(80));
        assert_eq!(verify_discount(&p, &item).unwrap(), dec!(80.00));
    }

    #[test]
    fn test_discount_runs_price_check_first() {
        let p = product("P-1", dec!(100.00), dec!(80.00));
        let item = request(dec!(101), 50, None, 1, dec!(50.50));
        let err = verify_discount(&p, &item).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnitPriceMismatch);
    }

    #[test]
    fn test_inactive_under_either_id() {
        let active = product("P-1", dec!(1), dec!(1));
        let mut disabled = active.clone();
        disabled.enabled = false;
        let mut deleted = active.clone();
        deleted.deleted = true;

        assert!(is_active(&active, &active).is_ok());
        assert_eq!(
            is_active(&active, &disabled).unwrap_err().kind(),
            ErrorKind::ProductNotActive
        );
        assert_eq!(
            is_active(&deleted, &active).unwrap_err().kind(),
            ErrorKind::ProductNotActive
        );
    }

    #[test]
    fn test_missing_fields_are_invalid_input() {
        let p = product("P-1", dec!(1), dec!(1));
        let mut item = request(dec!(1), 0, None, 1, dec!(1));
        item.line_total = None;
        assert_eq!(verify_line_total(&item).unwrap_err().kind(), ErrorKind::InvalidInput);

        item.unit_price = None;
        assert_eq!(verify_unit_price(&p, &item).unwrap_err().kind(), ErrorKind::InvalidInput);
    }
}
