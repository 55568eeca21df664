//! # Collaborator Interfaces
//!
//! The engine never owns products, stock or the sale store. It reaches
//! them through these traits, injected at construction.
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐      ┌──────────────────┐
//! │  ProductLookup   │      │ InventoryControl │      │    SaleStore     │
//! │                  │      │                  │      │                  │
//! │  get_by_id       │      │  check_available │      │  insert_sale     │
//! │  get_by_code     │      │  decrement       │      │  update_draft    │
//! │                  │      │  increment       │      │  save_return …   │
//! └────────┬─────────┘      └────────┬─────────┘      └────────┬─────────┘
//!          │ CollaboratorError       │ CollaboratorError       │ DbError
//!          └─────────────────────────┼─────────────────────────┘
//!                                    ▼
//!                              SaleService
//! ```
//!
//! Every call on all three is wrapped in a timeout by the engine, so
//! implementations do not need their own.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checkout_core::{CoreError, Product, Sale, SaleReturn, SaleStatus};
use checkout_db::DbResult;
use thiserror::Error;

use crate::error::EngineError;

/// Failure reported by a product or inventory collaborator.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or failed internally.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured timeout.
    #[error("{operation} timed out after {after:?}")]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },

    /// A decrement found less stock than requested.
    #[error("insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: i64 },
}

impl CollaboratorError {
    /// Maps onto the engine taxonomy. Only stock shortage is a business
    /// refusal; everything else is `DependencyUnavailable`.
    pub fn into_engine_error(self, collaborator: &'static str) -> EngineError {
        match self {
            CollaboratorError::InsufficientStock {
                product_id,
                requested,
            } => CoreError::InsufficientStock {
                product_id,
                requested,
            }
            .into(),
            other => EngineError::unavailable(collaborator, other.to_string()),
        }
    }
}

/// Runs one collaborator call under `timeout`.
///
/// A timeout is a hard failure. The call is dropped, never retried.
pub async fn bounded<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::TimedOut {
            operation,
            after: timeout,
        }),
    }
}

/// Authoritative product records.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Product by surrogate id.
    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, CollaboratorError>;

    /// Product by external product code.
    async fn get_by_code(&self, code: &str) -> Result<Option<Product>, CollaboratorError>;
}

/// Stock owned by the inventory service.
///
/// `decrement` is not idempotent. Callers must not retry it blindly.
#[async_trait]
pub trait InventoryControl: Send + Sync {
    async fn check_available(&self, product_id: &str, quantity: i64)
        -> Result<bool, CollaboratorError>;

    async fn decrement(&self, product_id: &str, quantity: i64) -> Result<(), CollaboratorError>;

    async fn increment(&self, product_id: &str, quantity: i64) -> Result<(), CollaboratorError>;
}

/// Persistence for sales and returns.
///
/// Each write is atomic on its own. Draft-only writes must refuse a sale
/// that is no longer a draft with `DbError::Conflict`.
#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn insert_sale(&self, sale: &Sale) -> DbResult<()>;

    /// Replaces a draft's header, items and payment.
    async fn update_draft(&self, sale: &Sale) -> DbResult<()>;

    async fn load_sale(&self, sale_id: &str) -> DbResult<Option<Sale>>;

    async fn delete_draft(&self, sale_id: &str) -> DbResult<()>;

    /// Records a return, bumps the item's returned quantity and touches
    /// the sale's `updated_at`.
    async fn save_return(
        &self,
        sale_return: &SaleReturn,
        sale_updated_at: DateTime<Utc>,
    ) -> DbResult<()>;

    async fn load_returns_by_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>>;

    async fn sales_by_status(&self, status: SaleStatus) -> DbResult<Vec<Sale>>;

    async fn sales_by_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>>;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result: Result<(), _> = bounded("check_available", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(CollaboratorError::TimedOut { operation: "check_available", .. })
        ));
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let result = bounded("get_by_id", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_error_mapping() {
        let short = CollaboratorError::InsufficientStock {
            product_id: "p-1".into(),
            requested: 4,
        };
        assert_eq!(
            short.into_engine_error("inventory").kind(),
            ErrorKind::InsufficientStock
        );

        let down = CollaboratorError::Unavailable("connection refused".into());
        assert_eq!(
            down.into_engine_error("catalogue").kind(),
            ErrorKind::DependencyUnavailable
        );
    }
}
