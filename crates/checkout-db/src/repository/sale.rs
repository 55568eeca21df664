//! # Sale Repository
//!
//! Database operations for sales, their line items and their payment.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE DRAFT                                                       │
//! │     └── insert() → sale + items + payment in one transaction           │
//! │                                                                         │
//! │  2. UPDATE DRAFT (any number of times)                                 │
//! │     └── update_draft() → items and payment replaced wholesale          │
//! │                                                                         │
//! │  3. FINALIZE                                                           │
//! │     └── update_draft() with status = finalized                         │
//! │                                                                         │
//! │  Every write on an existing sale is guarded by                         │
//! │  `WHERE status = 'draft'`: a finalized sale is never rewritten.        │
//! │                                                                         │
//! │  (OR) DELETE DRAFT                                                     │
//! │     └── delete_draft() → cascades to items and payment                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{decimal_column, encode_decimal, encode_optional_decimal, optional_decimal_column};
use crate::error::{DbError, DbResult};
use checkout_core::{LineItem, Payment, Sale, SaleStatus};

const SALE_COLUMNS: &str = "id, customer_id, status, total_quantity, total_amount, \
                            created_at, updated_at, finalized_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its items (in order) and payment.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    /// Lists sales in a status, oldest first.
    pub async fn list_by_status(&self, status: SaleStatus) -> DbResult<Vec<Sale>> {
        debug!(status = %status, "Listing sales by status");

        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE status = ?1 ORDER BY created_at, id");
        let rows = sqlx::query(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(&rows).await
    }

    /// Lists a customer's sales, oldest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        debug!(customer_id = %customer_id, "Listing sales by customer");

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE customer_id = ?1 ORDER BY created_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(&rows).await
    }

    /// Inserts a new sale, its items and its payment atomically.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, items = sale.items.len(), status = %sale.status, "Inserting sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, status, total_quantity, total_amount,
                created_at, updated_at, finalized_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.total_quantity)
        .bind(encode_decimal(sale.total_amount))
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.finalized_at)
        .execute(&mut *tx)
        .await?;

        insert_children(&mut tx, sale).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Rewrites a sale that is currently a draft in storage.
    ///
    /// Items and payment are replaced wholesale. `sale.status` may be
    /// `Finalized`, which is how a draft is finalized.
    ///
    /// ## Errors
    /// - `NotFound` if the sale doesn't exist
    /// - `Conflict` if the stored sale is no longer a draft
    pub async fn update_draft(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, status = %sale.status, "Updating draft sale");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                customer_id = ?2,
                status = ?3,
                total_quantity = ?4,
                total_amount = ?5,
                updated_at = ?6,
                finalized_at = ?7
            WHERE id = ?1 AND status = 'draft'
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.total_quantity)
        .bind(encode_decimal(sale.total_amount))
        .bind(sale.updated_at)
        .bind(sale.finalized_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_a_draft(&mut tx, &sale.id).await);
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(&sale.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM payments WHERE sale_id = ?1")
            .bind(&sale.id)
            .execute(&mut *tx)
            .await?;

        insert_children(&mut tx, sale).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a draft sale; items and payment go with it.
    ///
    /// ## Errors
    /// - `NotFound` if the sale doesn't exist
    /// - `Conflict` if the sale is finalized
    pub async fn delete_draft(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting draft sale");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1 AND status = 'draft'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_a_draft(&mut tx, id).await);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Counts sales in a status (for diagnostics).
    pub async fn count_by_status(&self, status: SaleStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn hydrate_all(&self, rows: &[SqliteRow]) -> DbResult<Vec<Sale>> {
        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            sales.push(self.hydrate(row).await?);
        }
        Ok(sales)
    }

    async fn hydrate(&self, row: &SqliteRow) -> DbResult<Sale> {
        let id: String = row.try_get("id")?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, sale_id, product_id, quantity, returned_quantity,
                   unit_price, discount_percent, discount_flat, line_total
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .iter()
            .map(line_item_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        let payment_row = sqlx::query(
            r#"
            SELECT sale_id, cash_amount, credit_card_amount, credit_card_reference,
                   qr_amount, qr_reference, cheque_amount, cheque_reference, due_amount
            FROM payments
            WHERE sale_id = ?1
            "#,
        )
        .bind(&id)
        .fetch_optional(&self.pool)
        .await?;

        let payment = payment_row.as_ref().map(payment_from_row).transpose()?;

        Ok(Sale {
            id,
            customer_id: row.try_get("customer_id")?,
            status: row.try_get("status")?,
            total_quantity: row.try_get("total_quantity")?,
            total_amount: decimal_column(row, "total_amount")?,
            items,
            payment,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            finalized_at: row.try_get("finalized_at")?,
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn insert_children(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    for (position, item) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, position, product_id, quantity, returned_quantity,
                unit_price, discount_percent, discount_flat, line_total
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.returned_quantity)
        .bind(encode_decimal(item.unit_price))
        .bind(item.discount_percent)
        .bind(encode_optional_decimal(item.discount_flat))
        .bind(encode_decimal(item.line_total))
        .execute(&mut *conn)
        .await?;
    }

    if let Some(payment) = &sale.payment {
        sqlx::query(
            r#"
            INSERT INTO payments (
                sale_id, cash_amount, credit_card_amount, credit_card_reference,
                qr_amount, qr_reference, cheque_amount, cheque_reference, due_amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(encode_optional_decimal(payment.cash_amount))
        .bind(encode_optional_decimal(payment.credit_card_amount))
        .bind(&payment.credit_card_reference)
        .bind(encode_optional_decimal(payment.qr_amount))
        .bind(&payment.qr_reference)
        .bind(encode_optional_decimal(payment.cheque_amount))
        .bind(&payment.cheque_reference)
        .bind(encode_optional_decimal(payment.due_amount))
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Explains why a draft-guarded write matched no row.
async fn not_a_draft(conn: &mut SqliteConnection, id: &str) -> DbError {
    let status: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT status FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await;

    match status {
        Ok(Some(status)) => DbError::conflict("Sale", id, format!("sale is {status}, not draft")),
        Ok(None) => DbError::not_found("Sale", id),
        Err(e) => e.into(),
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

fn line_item_from_row(row: &SqliteRow) -> DbResult<LineItem> {
    Ok(LineItem {
        id: row.try_get("id")?,
        sale_id: row.try_get("sale_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        returned_quantity: row.try_get("returned_quantity")?,
        unit_price: decimal_column(row, "unit_price")?,
        discount_percent: row.try_get("discount_percent")?,
        discount_flat: optional_decimal_column(row, "discount_flat")?,
        line_total: decimal_column(row, "line_total")?,
    })
}

fn payment_from_row(row: &SqliteRow) -> DbResult<Payment> {
    Ok(Payment {
        sale_id: row.try_get("sale_id")?,
        cash_amount: optional_decimal_column(row, "cash_amount")?,
        credit_card_amount: optional_decimal_column(row, "credit_card_amount")?,
        credit_card_reference: row.try_get("credit_card_reference")?,
        qr_amount: optional_decimal_column(row, "qr_amount")?,
        qr_reference: row.try_get("qr_reference")?,
        cheque_amount: optional_decimal_column(row, "cheque_amount")?,
        cheque_reference: row.try_get("cheque_reference")?,
        due_amount: optional_decimal_column(row, "due_amount")?,
    })
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new line item ID.
pub fn generate_line_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn draft(id: &str, customer: Option<&str>) -> Sale {
        let now = Utc::now();
        let items = vec![
            LineItem {
                id: generate_line_item_id(),
                sale_id: id.to_string(),
                product_id: "P-1".to_string(),
                quantity: 3,
                returned_quantity: 0,
                unit_price: dec!(500.00),
                discount_percent: 10,
                discount_flat: Some(dec!(20.00)),
                line_total: dec!(1290.00),
            },
            LineItem {
                id: generate_line_item_id(),
                sale_id: id.to_string(),
                product_id: "P-2".to_string(),
                quantity: 1,
                returned_quantity: 0,
                unit_price: dec!(10),
                discount_percent: 0,
                discount_flat: None,
                line_total: dec!(10),
            },
        ];
        Sale {
            id: id.to_string(),
            customer_id: customer.map(str::to_string),
            status: SaleStatus::Draft,
            total_quantity: 4,
            total_amount: dec!(1300.00),
            items,
            payment: None,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        }
    }

    fn cash(sale_id: &str, amount: rust_decimal::Decimal) -> Payment {
        Payment {
            sale_id: sale_id.to_string(),
            cash_amount: Some(amount),
            ..Default::default()
        }
    }

    async fn repo() -> SaleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().sales()
    }

    #[tokio::test]
    async fn test_insert_and_load_preserves_items_and_scale() {
        let repo = repo().await;
        let sale = draft("S-1", Some("C-1"));
        repo.insert(&sale).await.unwrap();

        let loaded = repo.get_by_id("S-1").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].product_id, "P-1");
        assert_eq!(loaded.items[0].discount_flat, Some(dec!(20.00)));
        assert_eq!(loaded.items[1].discount_flat, None);
        assert_eq!(loaded.total_amount.to_string(), "1300.00");
        assert_eq!(loaded.status, SaleStatus::Draft);
        assert!(loaded.payment.is_none());
    }

    #[tokio::test]
    async fn test_finalize_through_update_draft() {
        let repo = repo().await;
        let mut sale = draft("S-1", None);
        repo.insert(&sale).await.unwrap();

        sale.status = SaleStatus::Finalized;
        sale.payment = Some(cash("S-1", dec!(1300)));
        sale.finalized_at = Some(Utc::now());
        repo.update_draft(&sale).await.unwrap();

        let loaded = repo.get_by_id("S-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, SaleStatus::Finalized);
        assert_eq!(loaded.payment.unwrap().cash_amount, Some(dec!(1300)));
        assert!(loaded.finalized_at.is_some());

        // Finalized sales are never rewritten
        let err = repo.update_draft(&sale).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_draft_replaces_items() {
        let repo = repo().await;
        let mut sale = draft("S-1", None);
        repo.insert(&sale).await.unwrap();

        sale.items.truncate(1);
        sale.total_quantity = 3;
        sale.total_amount = dec!(1290.00);
        repo.update_draft(&sale).await.unwrap();

        let loaded = repo.get_by_id("S-1").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.total_quantity, 3);
    }

    #[tokio::test]
    async fn test_update_missing_sale_is_not_found() {
        let repo = repo().await;
        let err = repo.update_draft(&draft("nope", None)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_only_drafts() {
        let repo = repo().await;
        let mut sale = draft("S-1", None);
        repo.insert(&sale).await.unwrap();
        repo.delete_draft("S-1").await.unwrap();
        assert!(repo.get_by_id("S-1").await.unwrap().is_none());

        sale.status = SaleStatus::Finalized;
        repo.insert(&sale).await.unwrap();
        let err = repo.delete_draft("S-1").await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let err = repo.delete_draft("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_by_status_and_customer_in_creation_order() {
        let repo = repo().await;
        let base = Utc::now();

        for (i, id) in ["S-2", "S-1", "S-3"].iter().enumerate() {
            let mut sale = draft(id, Some(if i == 2 { "C-2" } else { "C-1" }));
            sale.created_at = base + Duration::seconds(i as i64);
            if *id == "S-3" {
                sale.status = SaleStatus::Finalized;
            }
            repo.insert(&sale).await.unwrap();
        }

        let drafts = repo.list_by_status(SaleStatus::Draft).await.unwrap();
        let ids: Vec<_> = drafts.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["S-2", "S-1"]);

        let c1 = repo.list_by_customer("C-1").await.unwrap();
        assert_eq!(c1.len(), 2);
        assert_eq!(repo.count_by_status(SaleStatus::Finalized).await.unwrap(), 1);
    }
}
