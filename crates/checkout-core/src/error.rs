//! # Error Types
//!
//! Domain-specific error types for checkout-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  checkout-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Closed taxonomy every failure maps onto        │
//! │                                                                         │
//! │  checkout-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  checkout-engine errors                                                │
//! │  └── EngineError      - Core + storage + collaborator unavailability   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller (kind/code)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every variant maps to exactly one [`ErrorKind`]
//! 5. A mismatch is a refusal, never an auto-correction

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::lifecycle::SaleOperation;
use crate::types::SaleStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// The closed set of failure kinds reported to callers.
///
/// Business-rule kinds are never retried automatically. Only
/// `DependencyUnavailable` and `Storage` are worth retrying, and only at the
/// granularity of the whole operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    ProductNotActive,
    UnitPriceMismatch,
    DiscountMismatch,
    TotalQuantityMismatch,
    TotalAmountMismatch,
    PaymentAmountMismatch,
    InsufficientStock,
    IllegalStateTransition,
    DependencyUnavailable,
    NotFound,
    Storage,
}

impl ErrorKind {
    /// Machine-readable code, e.g. `UNIT_PRICE_MISMATCH`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::ProductNotActive => "PRODUCT_NOT_ACTIVE",
            ErrorKind::UnitPriceMismatch => "UNIT_PRICE_MISMATCH",
            ErrorKind::DiscountMismatch => "DISCOUNT_MISMATCH",
            ErrorKind::TotalQuantityMismatch => "TOTAL_QUANTITY_MISMATCH",
            ErrorKind::TotalAmountMismatch => "TOTAL_AMOUNT_MISMATCH",
            ErrorKind::PaymentAmountMismatch => "PAYMENT_AMOUNT_MISMATCH",
            ErrorKind::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorKind::IllegalStateTransition => "ILLEGAL_STATE_TRANSITION",
            ErrorKind::DependencyUnavailable => "DEPENDENCY_UNAVAILABLE",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Storage => "STORAGE",
        }
    }

    /// True when the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::DependencyUnavailable | ErrorKind::Storage)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Verification failures
/// abort the enclosing operation before any persistence or stock mutation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input validation error (wraps ValidationError).
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Product is deleted or disabled under its id or its product code.
    #[error("Product {product_id} is not active")]
    ProductNotActive { product_id: String },

    /// Submitted unit price differs from the authoritative price.
    #[error("Unit price mismatch for {product_id}: expected {expected}, submitted {submitted}")]
    UnitPriceMismatch {
        product_id: String,
        expected: Decimal,
        submitted: Decimal,
    },

    /// Discounted unit price falls below the product's minimum price.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: price 100.00, min_price 80.00
    /// Cashier enters: 10% off, 15.00 flat
    ///      │
    ///      ▼
    /// discounted = 100.00 × 0.90 − 15.00 = 75.00
    ///      │
    ///      ▼
    /// 75.00 < 80.00 → DiscountMismatch
    /// ```
    #[error("Discount too large for {product_id}: discounted price {discounted} is below minimum {min_price}")]
    DiscountMismatch {
        product_id: String,
        min_price: Decimal,
        discounted: Decimal,
    },

    /// Submitted total quantity differs from the sum of line quantities.
    #[error("Total quantity mismatch: expected {expected}, submitted {submitted}")]
    TotalQuantityMismatch { expected: i64, submitted: i64 },

    /// Return requests more than remains unreturned on the line item.
    #[error("Cannot return {requested} of line item {line_item_id}: only {remaining} remain")]
    ReturnExceedsRemaining {
        line_item_id: String,
        remaining: i64,
        requested: i64,
    },

    /// Submitted line or sale total differs from the recomputed total.
    #[error("Total amount mismatch: expected {expected}, submitted {submitted}")]
    TotalAmountMismatch {
        expected: Decimal,
        submitted: Decimal,
    },

    /// Sum of payment components differs from the sale total.
    #[error("Payment amount mismatch: sale total {expected}, payment components sum to {paid}")]
    PaymentAmountMismatch { expected: Decimal, paid: Decimal },

    /// Inventory cannot cover the requested quantity.
    #[error("Insufficient stock for {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: i64 },

    /// Operation is not allowed in the sale's current status.
    #[error("Sale {sale_id} is {status}, cannot {operation}")]
    IllegalStateTransition {
        sale_id: String,
        status: SaleStatus,
        operation: SaleOperation,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Line item not found on the sale.
    #[error("Line item {line_item_id} not found on sale {sale_id}")]
    LineItemNotFound {
        sale_id: String,
        line_item_id: String,
    },

    /// Product cannot be found by the product lookup.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// One or more line items failed verification.
    ///
    /// Each item is checked fail-fast; every item is checked before this
    /// error is raised, so it carries all rejections at once.
    #[error("{} line item(s) rejected, first: {}", .0.len(), first_rejection(.0))]
    ItemsRejected(Vec<ItemRejection>),
}

impl CoreError {
    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::InvalidInput,
            CoreError::ProductNotActive { .. } => ErrorKind::ProductNotActive,
            CoreError::UnitPriceMismatch { .. } => ErrorKind::UnitPriceMismatch,
            CoreError::DiscountMismatch { .. } => ErrorKind::DiscountMismatch,
            CoreError::TotalQuantityMismatch { .. } => ErrorKind::TotalQuantityMismatch,
            CoreError::ReturnExceedsRemaining { .. } => ErrorKind::TotalQuantityMismatch,
            CoreError::TotalAmountMismatch { .. } => ErrorKind::TotalAmountMismatch,
            CoreError::PaymentAmountMismatch { .. } => ErrorKind::PaymentAmountMismatch,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::IllegalStateTransition { .. } => ErrorKind::IllegalStateTransition,
            CoreError::SaleNotFound(_)
            | CoreError::LineItemNotFound { .. }
            | CoreError::ProductNotFound(_) => ErrorKind::NotFound,
            CoreError::ItemsRejected(rejections) => rejections
                .first()
                .map(|r| r.error.kind())
                .unwrap_or(ErrorKind::InvalidInput),
        }
    }

    /// `InvalidInput` for a computation that overflowed on `field`.
    pub fn overflow(field: impl Into<String>) -> Self {
        CoreError::Validation(ValidationError::Overflow {
            field: field.into(),
        })
    }

    /// Shorthand for an `InvalidInput` error on a single field.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Validation(ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

fn first_rejection(rejections: &[ItemRejection]) -> String {
    rejections
        .first()
        .map(|r| r.to_string())
        .unwrap_or_default()
}

// =============================================================================
// Item Rejection
// =============================================================================

/// A single line item that failed verification.
#[derive(Debug)]
pub struct ItemRejection {
    /// Zero-based position of the item in the submitted order.
    pub position: usize,
    pub product_id: String,
    pub error: CoreError,
}

impl std::fmt::Display for ItemRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "item #{} ({}): {}",
            self.position, self.product_id, self.error
        )
    }
}

/// Turns collected rejections into a result.
///
/// Empty means every item passed.
pub fn rejections_to_result(rejections: Vec<ItemRejection>) -> CoreResult<()> {
    if rejections.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ItemsRejected(rejections))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when submitted input doesn't meet basic requirements.
/// Used for early validation before verification runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Arithmetic on the value leaves the representable decimal range.
    #[error("{field} is too large to compute")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
