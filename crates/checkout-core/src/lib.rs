//! # checkout-core: Pure Sale Consistency Logic
//!
//! This crate is the **heart** of the checkout engine. It decides whether a
//! submitted sale is financially consistent, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 checkout-engine (orchestration)                 │   │
//! │  │   create_sale, update_sale, finalize_sale, process_return       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ checkout-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────────┐  ┌─────────────┐  │   │
//! │  │   │  money  │  │ pricing │  │item_verifier │  │sale_verifier│  │   │
//! │  │   │ sum/eq  │─►│discount │─►│ price, min,  │  │ totals,     │  │   │
//! │  │   │ round   │  │ totals  │  │ line total   │  │ payment     │  │   │
//! │  │   └─────────┘  └─────────┘  └──────────────┘  └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 checkout-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Null-safe, scale-insensitive decimal helpers
//! - [`pricing`] - Discounted unit price, line and sale totals
//! - [`item_verifier`] - Line item checks against the authoritative product
//! - [`sale_verifier`] - Sale-level totals and payment split checks
//! - [`lifecycle`] - Which operation is legal in which sale status
//! - [`types`] - Domain types (Sale, LineItem, Payment, SaleReturn, Product)
//! - [`request`] - Submitted, not yet verified sale payloads
//! - [`validation`] - Input validation that runs before verification
//! - [`error`] - Domain error types and the error kind taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use checkout_core::pricing::line_total;
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! // 500.00 at 10% off, minus 20.00 flat, times 3
//! let total = line_total(
//!     Some(Decimal::from_str("500.00").unwrap()),
//!     10,
//!     Some(Decimal::from_str("20.00").unwrap()),
//!     3,
//! )
//! .unwrap();
//!
//! assert_eq!(total, Decimal::from_str("1290.00").unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod item_verifier;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod request;
pub mod sale_verifier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ItemRejection, ValidationError};
pub use lifecycle::{ReturnState, SaleOperation};
pub use request::{LineItemRequest, PaymentRequest, ReturnRequest, SaleRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of decimal places of the currency's minor unit.
///
/// The percentage discount step is rounded half-up to this scale.
pub const CURRENCY_SCALE: u32 = 2;

/// Maximum line items allowed in a single sale.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a return reason.
pub const MAX_RETURN_REASON_LEN: usize = 500;
