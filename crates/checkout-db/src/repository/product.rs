//! # Product Repository
//!
//! The local catalogue: authoritative product records and the stock ledger
//! for a single-store deployment.
//!
//! ## Key Operations
//! - Lookup by surrogate id and by product code
//! - Guarded stock deltas
//! - Enable/disable and soft delete

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{decimal_column, encode_decimal};
use crate::error::{DbError, DbResult};
use checkout_core::Product;

const PRODUCT_COLUMNS: &str = "id, product_code, name, price, min_price, enabled, deleted";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_code("BEV-001").await?;
/// repo.decrement_stock(&product.id, 2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by surrogate id, deleted or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    /// Gets a product by external product code, deleted or not.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_code = ?1");
        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    /// Inserts a new product with an opening stock level.
    pub async fn insert(&self, product: &Product, stock: i64) -> DbResult<()> {
        debug!(id = %product.id, code = %product.product_code, stock, "Inserting product");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, product_code, name, price, min_price,
                enabled, deleted, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.product_code)
        .bind(&product.name)
        .bind(encode_decimal(product.price))
        .bind(encode_decimal(product.min_price))
        .bind(product.enabled)
        .bind(product.deleted)
        .bind(stock)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: product.product_code.clone(),
            },
            other => other,
        })?;

        Ok(())
    }

    /// Current stock of a product.
    pub async fn stock(&self, id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Whether at least `quantity` units are in stock.
    pub async fn has_stock(&self, id: &str, quantity: i64) -> DbResult<bool> {
        Ok(self.stock(id).await? >= quantity)
    }

    /// Takes `quantity` units out of stock.
    ///
    /// ## Delta Pattern
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ❌ WRONG: read, compute, write back                               │
    /// │     SELECT stock → 7;  UPDATE products SET stock = 4               │
    /// │     (a concurrent sale between the two statements is lost)         │
    /// │                                                                     │
    /// │  ✅ CORRECT: one guarded delta statement                            │
    /// │     UPDATE products SET stock = stock - 3                          │
    /// │     WHERE id = ? AND stock >= 3                                    │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Errors
    /// - `NotFound` if the product doesn't exist
    /// - `Conflict` if stock is below `quantity` (nothing is changed)
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing product from a short one
            self.stock(id).await?;
            return Err(DbError::conflict("Product", id, "insufficient stock"));
        }

        Ok(())
    }

    /// Puts `quantity` units back into stock.
    pub async fn increment_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity, "Incrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Enables or disables a product.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> DbResult<()> {
        debug!(id = %id, enabled, "Setting product enabled flag");

        let result = sqlx::query("UPDATE products SET enabled = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(enabled)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product.
    ///
    /// Historical sales still reference it, so the row stays.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET deleted = 1, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts sellable products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE enabled = 1 AND deleted = 0")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

fn product_from_row(row: &SqliteRow) -> DbResult<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        product_code: row.try_get("product_code")?,
        name: row.try_get("name")?,
        price: decimal_column(row, "price")?,
        min_price: decimal_column(row, "min_price")?,
        enabled: row.try_get("enabled")?,
        deleted: row.try_get("deleted")?,
    })
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
