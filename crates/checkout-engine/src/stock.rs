//! # Stock Coordinator
//!
//! Commits a sale's stock effect against the inventory collaborator
//! without a distributed transaction.
//!
//! ## Finalize Ordering
//! ```text
//! items: [A×2, B×1, C×5, A×1]
//!
//!   phase 1 ─ check_available(A,3)  check_available(B,1)  check_available(C,5)
//!             (one check per product, quantities summed across lines)
//!             any false / error ──► abort, nothing decremented
//!
//!   phase 2 ─ decrement(A,2) ──► decrement(B,1) ──► decrement(C,5) ──► decrement(A,1)
//!                                        │
//!                                   fails here
//!                                        │
//!             compensate ◄───────────────┘
//!             increment(A,2)            (only what succeeded)
//! ```
//!
//! Compensation failures are logged at `error!` and do not replace the
//! original error.

use std::sync::Arc;
use std::time::Duration;

use checkout_core::{CoreError, LineItem};
use tracing::{debug, error, info, warn};

use crate::collaborators::{bounded, InventoryControl};
use crate::error::EngineResult;

const COLLABORATOR: &str = "inventory";

/// A decrement that has been applied and may need undoing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedDecrement {
    pub product_id: String,
    pub quantity: i64,
}

/// Availability checks, commits and restores against inventory.
#[derive(Clone)]
pub struct StockCoordinator {
    inventory: Arc<dyn InventoryControl>,
    timeout: Duration,
}

impl StockCoordinator {
    pub fn new(inventory: Arc<dyn InventoryControl>, timeout: Duration) -> Self {
        Self { inventory, timeout }
    }

    /// Whether inventory can cover `quantity` of the product.
    pub async fn check_availability(&self, product_id: &str, quantity: i64) -> EngineResult<bool> {
        bounded(
            "check_available",
            self.timeout,
            self.inventory.check_available(product_id, quantity),
        )
        .await
        .map_err(|e| e.into_engine_error(COLLABORATOR))
    }

    /// Decrements one product. Not idempotent.
    pub async fn commit_decrement(&self, product_id: &str, quantity: i64) -> EngineResult<()> {
        bounded(
            "decrement",
            self.timeout,
            self.inventory.decrement(product_id, quantity),
        )
        .await
        .map_err(|e| e.into_engine_error(COLLABORATOR))
    }

    /// Puts returned units back into stock.
    pub async fn restore_on_return(&self, product_id: &str, quantity: i64) -> EngineResult<()> {
        bounded(
            "increment",
            self.timeout,
            self.inventory.increment(product_id, quantity),
        )
        .await
        .map_err(|e| e.into_engine_error(COLLABORATOR))
    }

    /// Commits stock for every item, or for none.
    ///
    /// Every availability check completes before the first decrement, one
    /// per product for the quantity summed over its lines. Decrements then
    /// run per line. If one fails, the ones already applied are compensated.
    ///
    /// ## Errors
    /// - `InsufficientStock` if any item is unavailable
    /// - `DependencyUnavailable` if inventory times out or fails
    pub async fn commit_sale(&self, sale_id: &str, items: &[LineItem]) -> EngineResult<Vec<CommittedDecrement>> {
        for (product_id, requested) in requested_per_product(items) {
            if !self.check_availability(product_id, requested).await? {
                warn!(
                    sale_id = %sale_id,
                    product_id = %product_id,
                    requested,
                    "Stock unavailable, finalize aborted"
                );
                return Err(CoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested,
                }
                .into());
            }
        }

        let mut committed = Vec::with_capacity(items.len());
        for item in items {
            if let Err(e) = self.commit_decrement(&item.product_id, item.quantity).await {
                warn!(
                    sale_id = %sale_id,
                    product_id = %item.product_id,
                    error = %e,
                    "Stock decrement failed, compensating"
                );
                self.compensate(sale_id, &committed).await;
                return Err(e);
            }
            committed.push(CommittedDecrement {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }

        info!(sale_id = %sale_id, items = committed.len(), "Stock committed");
        Ok(committed)
    }

    /// Undoes applied decrements with increments, newest first.
    ///
    /// Returns how many could not be undone.
    pub async fn compensate(&self, sale_id: &str, committed: &[CommittedDecrement]) -> usize {
        let mut failed = 0;
        for decrement in committed.iter().rev() {
            match self
                .restore_on_return(&decrement.product_id, decrement.quantity)
                .await
            {
                Ok(()) => debug!(
                    sale_id = %sale_id,
                    product_id = %decrement.product_id,
                    quantity = decrement.quantity,
                    "Decrement compensated"
                ),
                Err(e) => {
                    failed += 1;
                    error!(
                        sale_id = %sale_id,
                        product_id = %decrement.product_id,
                        quantity = decrement.quantity,
                        error = %e,
                        "Stock compensation failed; inventory needs manual correction"
                    );
                }
            }
        }
        failed
    }

    /// Takes back a restore whose return could not be recorded.
    pub async fn undo_restore(&self, sale_id: &str, product_id: &str, quantity: i64) {
        if let Err(e) = self.commit_decrement(product_id, quantity).await {
            error!(
                sale_id = %sale_id,
                product_id = %product_id,
                quantity,
                error = %e,
                "Failed to undo return restock; inventory needs manual correction"
            );
        }
    }
}

/// Quantity per product across all lines, in first-seen order.
fn requested_per_product(items: &[LineItem]) -> Vec<(&str, i64)> {
    let mut totals: Vec<(&str, i64)> = Vec::new();
    for item in items {
        match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(item.quantity),
            None => totals.push((item.product_id.as_str(), item.quantity)),
        }
    }
    totals
}
