//! # Local Catalogue
//!
//! Backs [`ProductLookup`] and [`InventoryControl`] with the local
//! `products` table, for single-store deployments and development.
//!
//! ```text
//! SaleService ──► LocalCatalog ──► ProductRepository ──► products (SQLite)
//!                 (this module)     get_by_id / get_by_code
//!                                   has_stock / decrement_stock / increment_stock
//! ```
//!
//! Remote catalogue or inventory services implement the same traits.

use async_trait::async_trait;
use checkout_core::Product;
use checkout_db::{Database, DbError};

use crate::collaborators::{CollaboratorError, InventoryControl, ProductLookup};

/// Product and stock collaborator over the local database.
#[derive(Clone)]
pub struct LocalCatalog {
    db: Database,
}

impl LocalCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn unavailable(err: DbError) -> CollaboratorError {
    CollaboratorError::Unavailable(err.to_string())
}

#[async_trait]
impl ProductLookup for LocalCatalog {
    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, CollaboratorError> {
        self.db.products().get_by_id(id).await.map_err(unavailable)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Product>, CollaboratorError> {
        self.db.products().get_by_code(code).await.map_err(unavailable)
    }
}

#[async_trait]
impl InventoryControl for LocalCatalog {
    async fn check_available(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Result<bool, CollaboratorError> {
        match self.db.products().has_stock(product_id, quantity).await {
            Ok(available) => Ok(available),
            // Nothing to sell from
            Err(DbError::NotFound { .. }) => Ok(false),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn decrement(&self, product_id: &str, quantity: i64) -> Result<(), CollaboratorError> {
        match self.db.products().decrement_stock(product_id, quantity).await {
            Ok(()) => Ok(()),
            Err(DbError::Conflict { .. }) | Err(DbError::NotFound { .. }) => {
                Err(CollaboratorError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested: quantity,
                })
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn increment(&self, product_id: &str, quantity: i64) -> Result<(), CollaboratorError> {
        self.db
            .products()
            .increment_stock(product_id, quantity)
            .await
            .map_err(unavailable)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
