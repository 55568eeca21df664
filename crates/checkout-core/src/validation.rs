//! # Validation Module
//!
//! Shape checks on submitted input. These run before verification and
//! never consult a product or a stored sale.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checking Layers                                    │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (shape)                                          │
//! │  ├── quantities in range, percent 0..=100                              │
//! │  └── no negative money, ids present                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: item_verifier / sale_verifier (consistency)                  │
//! │  ├── prices against the authoritative product                          │
//! │  └── totals and payment split against the line items                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on quantities and status                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use checkout_core::validation::{validate_quantity, SaleLimits};
//!
//! let limits = SaleLimits::default();
//! assert!(validate_quantity(5, &limits).is_ok());
//! assert!(validate_quantity(0, &limits).is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::request::{LineItemRequest, PaymentRequest, ReturnRequest, SaleRequest};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_RETURN_REASON_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Size limits on a single sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLimits {
    pub max_items: usize,
    pub max_item_quantity: i64,
}

impl Default for SaleLimits {
    fn default() -> Self {
        Self {
            max_items: MAX_CART_ITEMS,
            max_item_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a non-empty identifier.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an external product code such as `BEV-001`.
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Letters, numbers, hyphens and underscores only
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "product_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "product_code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a return reason: present and at most 500 characters.
pub fn validate_return_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > MAX_RETURN_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_RETURN_REASON_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `limits.max_item_quantity`
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       ├── qty > max? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → item goes on to verification                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64, limits: &SaleLimits) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > limits.max_item_quantity {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: limits.max_item_quantity,
        });
    }

    Ok(())
}

/// Validates a discount percentage (0 to 100 inclusive).
pub fn validate_discount_percent(percent: i32) -> ValidationResult<()> {
    if !(0..=100).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates that an optional amount is not negative. `None` passes.
///
/// ## Example
/// ```rust
/// use checkout_core::validation::validate_non_negative;
/// use rust_decimal::Decimal;
///
/// assert!(validate_non_negative("cash_amount", Some(Decimal::ZERO)).is_ok());
/// assert!(validate_non_negative("cash_amount", None).is_ok());
/// assert!(validate_non_negative("cash_amount", Some(Decimal::new(-1, 2))).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Option<Decimal>) -> ValidationResult<()> {
    match amount {
        Some(value) if value < Decimal::ZERO => Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items in a sale (1 to `max_items`).
pub fn validate_cart_size(items: usize, limits: &SaleLimits) -> ValidationResult<()> {
    if items == 0 || items > limits.max_items {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: limits.max_items as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Shape checks for one submitted line item.
pub fn validate_line_item(item: &LineItemRequest, limits: &SaleLimits) -> ValidationResult<()> {
    validate_id("product_id", &item.product_id)?;
    validate_quantity(item.quantity, limits)?;
    validate_discount_percent(item.discount_percent)?;
    validate_non_negative("unit_price", item.unit_price)?;
    validate_non_negative("discount_flat", item.discount_flat)?;
    Ok(())
}

/// Every payment component must be zero or more.
pub fn validate_payment(payment: &PaymentRequest) -> ValidationResult<()> {
    for (field, amount) in payment.named_components() {
        validate_non_negative(field, amount)?;
    }
    Ok(())
}

/// Sale-level shape checks.
///
/// Per-item shape failures are reported by the orchestrator together with
/// item verification, so only sale-wide fields are checked here.
pub fn validate_sale_request(request: &SaleRequest, limits: &SaleLimits) -> ValidationResult<()> {
    validate_cart_size(request.items.len(), limits)?;

    if request.total_quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "total_quantity".to_string(),
        });
    }
    if request.total_amount.is_none() {
        return Err(ValidationError::Required {
            field: "total_amount".to_string(),
        });
    }
    if let Some(customer_id) = &request.customer_id {
        validate_id("customer_id", customer_id)?;
    }
    if let Some(payment) = &request.payment {
        validate_payment(payment)?;
    }

    Ok(())
}

/// Shape checks for a return request.
pub fn validate_return_request(request: &ReturnRequest) -> ValidationResult<()> {
    validate_id("sale_id", &request.sale_id)?;
    validate_id("line_item_id", &request.line_item_id)?;

    if request.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    validate_return_reason(&request.reason)
}

// =============================================================================
// Unit Tests
// =============================================================================
