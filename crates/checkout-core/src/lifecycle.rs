//! # Sale Lifecycle Rules
//!
//! The pure half of the sale state machine: which operation is legal in
//! which status, and the derived return view.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► ┌─────────┐  finalize   ┌───────────┐                     │
//! │              │  DRAFT  │ ──────────► │ FINALIZED │ ──┐ return          │
//! │   update ──► └─────────┘             └───────────┘ ◄─┘ (repeatable)    │
//! │   delete ──►      │                        │                            │
//! │                   ▼                        ▼                            │
//! │               (removed)          derived ReturnState:                   │
//! │                                  NotReturned → PartiallyReturned        │
//! │                                              → FullyReturned            │
//! │                                                                         │
//! │   No transition ever goes back to DRAFT.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{LineItem, Sale, SaleStatus};

// =============================================================================
// Operations
// =============================================================================

/// A mutating operation on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleOperation {
    Create,
    Update,
    Finalize,
    Delete,
    Return,
}

impl SaleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleOperation::Create => "create",
            SaleOperation::Update => "update",
            SaleOperation::Finalize => "finalize",
            SaleOperation::Delete => "delete",
            SaleOperation::Return => "return",
        }
    }
}

impl std::fmt::Display for SaleOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SaleStatus {
    /// Whether `operation` may run on a sale in this status.
    pub fn allows(&self, operation: SaleOperation) -> bool {
        match operation {
            // Create never targets an existing sale
            SaleOperation::Create => false,
            SaleOperation::Update | SaleOperation::Finalize | SaleOperation::Delete => {
                *self == SaleStatus::Draft
            }
            SaleOperation::Return => *self == SaleStatus::Finalized,
        }
    }
}

/// Fails with `IllegalStateTransition` unless `operation` is legal on `sale`.
pub fn ensure_can(sale: &Sale, operation: SaleOperation) -> CoreResult<()> {
    if sale.status.allows(operation) {
        Ok(())
    } else {
        Err(CoreError::IllegalStateTransition {
            sale_id: sale.id.clone(),
            status: sale.status,
            operation,
        })
    }
}

/// Checks that `quantity` units of `line_item_id` can be returned.
///
/// ## Errors
/// - `IllegalStateTransition` unless the sale is FINALIZED
/// - `NotFound` if the line item is not on the sale
/// - `TotalQuantityMismatch` if more than the remaining quantity is requested
pub fn ensure_returnable<'a>(
    sale: &'a Sale,
    line_item_id: &str,
    quantity: i64,
) -> CoreResult<&'a LineItem> {
    ensure_can(sale, SaleOperation::Return)?;

    let item = sale
        .item(line_item_id)
        .ok_or_else(|| CoreError::LineItemNotFound {
            sale_id: sale.id.clone(),
            line_item_id: line_item_id.to_string(),
        })?;

    let remaining = item.returnable_quantity();
    if quantity > remaining {
        return Err(CoreError::ReturnExceedsRemaining {
            line_item_id: line_item_id.to_string(),
            remaining,
            requested: quantity,
        });
    }

    Ok(item)
}

// =============================================================================
// Derived Return View
// =============================================================================

/// How much of a finalized sale has been returned. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnState {
    NotReturned,
    PartiallyReturned,
    FullyReturned,
}

/// Σ returned vs Σ quantity over the items.
pub fn return_state(items: &[LineItem]) -> ReturnState {
    let sold: i64 = items.iter().map(|item| item.quantity).sum();
    let returned: i64 = items.iter().map(|item| item.returned_quantity).sum();

    if returned <= 0 {
        ReturnState::NotReturned
    } else if returned >= sold {
        ReturnState::FullyReturned
    } else {
        ReturnState::PartiallyReturned
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
