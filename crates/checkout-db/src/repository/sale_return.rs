//! # Return Repository
//!
//! Return records and the running `returned_quantity` on line items.
//!
//! ```text
//! record(return) ── one transaction ──────────────────────────────────────
//!   1. UPDATE sale_items SET returned_quantity = returned_quantity + q
//!      WHERE returned_quantity + q <= quantity        (bound re-checked)
//!   2. UPDATE sales SET updated_at = ?  WHERE status = 'finalized'
//!   3. INSERT INTO sale_returns
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{decimal_column, encode_decimal};
use crate::error::{DbError, DbResult};
use checkout_core::SaleReturn;

/// Repository for return records.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Records a return and bumps the line item's returned quantity.
    ///
    /// `sale_updated_at` becomes the sale's new `updated_at`.
    ///
    /// ## Errors
    /// - `Conflict` if the line item would be over-returned, or the sale
    ///   is not finalized
    /// - `NotFound` if the line item is not on the sale
    pub async fn record(&self, sale_return: &SaleReturn, sale_updated_at: DateTime<Utc>) -> DbResult<()> {
        debug!(
            sale_id = %sale_return.sale_id,
            line_item_id = %sale_return.line_item_id,
            quantity = sale_return.quantity,
            "Recording return"
        );

        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            r#"
            UPDATE sale_items
            SET returned_quantity = returned_quantity + ?3
            WHERE id = ?1 AND sale_id = ?2 AND returned_quantity + ?3 <= quantity
            "#,
        )
        .bind(&sale_return.line_item_id)
        .bind(&sale_return.sale_id)
        .bind(sale_return.quantity)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM sale_items WHERE id = ?1 AND sale_id = ?2")
                    .bind(&sale_return.line_item_id)
                    .bind(&sale_return.sale_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match exists {
                Some(_) => DbError::conflict(
                    "Line item",
                    &sale_return.line_item_id,
                    "return exceeds remaining quantity",
                ),
                None => DbError::not_found("Line item", &sale_return.line_item_id),
            });
        }

        let touched = sqlx::query(
            "UPDATE sales SET updated_at = ?2 WHERE id = ?1 AND status = 'finalized'",
        )
        .bind(&sale_return.sale_id)
        .bind(sale_updated_at)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Sale",
                &sale_return.sale_id,
                "returns require a finalized sale",
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO sale_returns (
                id, sale_id, line_item_id, quantity, reason, refund_amount, return_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sale_return.id)
        .bind(&sale_return.sale_id)
        .bind(&sale_return.line_item_id)
        .bind(sale_return.quantity)
        .bind(&sale_return.reason)
        .bind(encode_decimal(sale_return.refund_amount))
        .bind(sale_return.return_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists a sale's returns, oldest first.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sale_id, line_item_id, quantity, reason, refund_amount, return_date
            FROM sale_returns
            WHERE sale_id = ?1
            ORDER BY return_date, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(return_from_row).collect()
    }
}

fn return_from_row(row: &SqliteRow) -> DbResult<SaleReturn> {
    Ok(SaleReturn {
        id: row.try_get("id")?,
        sale_id: row.try_get("sale_id")?,
        line_item_id: row.try_get("line_item_id")?,
        quantity: row.try_get("quantity")?,
        reason: row.try_get("reason")?,
        refund_amount: decimal_column(row, "refund_amount")?,
        return_date: row.try_get("return_date")?,
    })
}

/// Generates a new return ID.
pub fn generate_return_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
