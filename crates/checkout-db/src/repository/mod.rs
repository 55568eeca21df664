//! # Repository Module
//!
//! Database repository implementations for the checkout store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  checkout-engine (SaleStore / LocalCatalog adapters)                   │
//! │       │                                                                 │
//! │       │  db.sales().save(&sale)                                        │
//! │       ▼                                                                 │
//! │  SaleRepository      ReturnRepository      ProductRepository           │
//! │  ├── save            ├── record            ├── get_by_id / get_by_code │
//! │  ├── get_by_id       └── list_by_sale      ├── decrement_stock         │
//! │  ├── list_by_*                             └── increment_stock         │
//! │  └── delete_draft                                                      │
//! │       │                                                                 │
//! │       │  SQL (one transaction per write)                               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalogue and stock ledger
//! - [`SaleRepository`](sale::SaleRepository) - Sales, line items, payments
//! - [`ReturnRepository`](sale_return::ReturnRepository) - Return records

pub mod product;
pub mod sale;
pub mod sale_return;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

// =============================================================================
// Decimal Columns
// =============================================================================
//
// Money is stored as TEXT. A value that does not parse back is corruption
// and is reported, never read as zero.

pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|_| DbError::corrupt(column, raw))
}

pub(crate) fn optional_decimal_column(row: &SqliteRow, column: &str) -> DbResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| Decimal::from_str(&raw).map_err(|_| DbError::corrupt(column, raw)))
        .transpose()
}

pub(crate) fn encode_decimal(value: Decimal) -> String {
    value.to_string()
}

pub(crate) fn encode_optional_decimal(value: Option<Decimal>) -> Option<String> {
    value.map(encode_decimal)
}
