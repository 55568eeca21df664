//! # Domain Types
//!
//! Core domain types used throughout the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  product_code   │   │  status         │   │  cash, card,    │       │
//! │  │  price          │   │  total_quantity │   │  qr, cheque,    │       │
//! │  │  min_price      │   │  total_amount   │   │  due            │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ owns                                  │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │    LineItem     │◄──│   SaleReturn    │       │
//! │                        │  quantity       │   │  quantity       │       │
//! │                        │  returned_qty   │   │  refund_amount  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A product is known both by:
//! - `id`: surrogate UUID used for relations
//! - `product_code`: external business code (e.g. `BEV-001`)
//!
//! The two id spaces may disagree during catalogue migrations, which is why
//! [`crate::item_verifier::is_active`] consults both records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lifecycle::{self, ReturnState};
use crate::money;

// =============================================================================
// Product
// =============================================================================

/// Authoritative product record, fetched from the product lookup.
///
/// The engine only reads it. Stock is owned by the inventory collaborator
/// and is deliberately not part of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Surrogate identifier (UUID v4).
    pub id: String,

    /// External product code, unique within the catalogue.
    pub product_code: String,

    /// Display name.
    pub name: String,

    /// Current list price.
    #[ts(as = "String")]
    pub price: Decimal,

    /// Lowest unit price a discount may bring the product down to.
    #[ts(as = "String")]
    pub min_price: Decimal,

    pub enabled: bool,

    /// Soft-delete flag.
    pub deleted: bool,
}

impl Product {
    /// Whether this single record may be sold.
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.enabled && !self.deleted
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The stored status of a sale.
///
/// "Partially returned" is not a status: see [`ReturnState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Editable and deletable, no stock committed.
    Draft,
    /// Stock committed and payment verified. Only returns are allowed.
    Finalized,
}

impl SaleStatus {
    /// Lowercase name, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Finalized => "finalized",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Draft
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry within a sale.
///
/// ## Invariant
/// `line_total == (unit_price × (100 − discount_percent) / 100 − discount_flat) × quantity`
/// with the percentage step rounded half-up. Enforced by
/// [`crate::item_verifier::verify_line_total`] before a line item is ever
/// built from a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Running sum of returned units, never above `quantity`.
    pub returned_quantity: i64,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    pub discount_percent: i32,
    /// Flat discount per unit, applied after the percentage. `None` means zero.
    #[ts(as = "Option<String>")]
    pub discount_flat: Option<Decimal>,
    #[ts(as = "String")]
    pub line_total: Decimal,
}

impl LineItem {
    #[inline]
    pub fn discount_flat_or_zero(&self) -> Decimal {
        money::or_zero(self.discount_flat)
    }

    /// Units that can still be returned.
    #[inline]
    pub fn returnable_quantity(&self) -> i64 {
        (self.quantity - self.returned_quantity).max(0)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How a sale was paid, split across tenders.
///
/// Every component is optional and counts as zero when absent. `due_amount`
/// is an outstanding balance and counts toward the total like any tender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub sale_id: String,
    #[ts(as = "Option<String>")]
    pub cash_amount: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub credit_card_amount: Option<Decimal>,
    pub credit_card_reference: Option<String>,
    #[ts(as = "Option<String>")]
    pub qr_amount: Option<Decimal>,
    pub qr_reference: Option<String>,
    #[ts(as = "Option<String>")]
    pub cheque_amount: Option<Decimal>,
    pub cheque_reference: Option<String>,
    #[ts(as = "Option<String>")]
    pub due_amount: Option<Decimal>,
}

impl Payment {
    /// Sum of all components, `None` if it overflows.
    pub fn total(&self) -> Option<Decimal> {
        money::sum(self.components())
    }

    /// Amount components in a fixed order: cash, card, QR, cheque, due.
    pub fn components(&self) -> [Option<Decimal>; 5] {
        [
            self.cash_amount,
            self.credit_card_amount,
            self.qr_amount,
            self.cheque_amount,
            self.due_amount,
        ]
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A draft or finalized sale transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub total_quantity: i64,
    #[ts(as = "String")]
    pub total_amount: Decimal,
    /// Line items in submission order.
    pub items: Vec<LineItem>,
    /// Optional while DRAFT, always present once FINALIZED.
    pub payment: Option<Payment>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Derived return view.
    pub fn return_state(&self) -> ReturnState {
        match self.status {
            SaleStatus::Draft => ReturnState::NotReturned,
            SaleStatus::Finalized => lifecycle::return_state(&self.items),
        }
    }

    /// Finds a line item by id.
    pub fn item(&self, line_item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == line_item_id)
    }
}

// =============================================================================
// Sale Return
// =============================================================================

/// A partial reversal of one line item of a finalized sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReturn {
    pub id: String,
    pub sale_id: String,
    pub line_item_id: String,
    pub quantity: i64,
    pub reason: String,
    #[ts(as = "String")]
    pub refund_amount: Decimal,
    #[ts(as = "String")]
    pub return_date: DateTime<Utc>,
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn line_item(
        product_id: &str,
        quantity: i64,
        unit_price: Decimal,
        discount_percent: i32,
        discount_flat: Option<Decimal>,
        line_total: Decimal,
    ) -> LineItem {
        LineItem {
            id: format!("line-{product_id}"),
            sale_id: "sale-1".to_string(),
            product_id: product_id.to_string(),
            quantity,
            returned_quantity: 0,
            unit_price,
            discount_percent,
            discount_flat,
            line_total,
        }
    }

    pub fn product(id: &str, price: Decimal, min_price: Decimal) -> Product {
        Product {
            id: id.to_string(),
            product_code: format!("CODE-{id}"),
            name: format!("Product {id}"),
            price,
            min_price,
            enabled: true,
            deleted: false,
        }
    }

    pub fn sale(items: Vec<LineItem>, total_quantity: i64, total_amount: Decimal) -> Sale {
        let now = Utc::now();
        Sale {
            id: "sale-1".to_string(),
            customer_id: None,
            status: SaleStatus::Draft,
            total_quantity,
            total_amount,
            items,
            payment: None,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sale_status_default_and_display() {
        assert_eq!(SaleStatus::default(), SaleStatus::Draft);
        assert_eq!(SaleStatus::Finalized.to_string(), "finalized");
    }

    #[test]
    fn test_sale_status_serializes_snake_case() {
        let json = serde_json::to_string(&SaleStatus::Finalized).unwrap();
        assert_eq!(json, "\"finalized\"");
    }

    #[test]
    fn test_payment_total_with_missing_components() {
        let payment = Payment {
            sale_id: "sale-1".to_string(),
            cash_amount: Some(dec!(100)),
            credit_card_amount: Some(dec!(50.00)),
            due_amount: Some(dec!(0.01)),
            ..Default::default()
        };
        assert_eq!(payment.total(), Some(dec!(150.01)));
        assert_eq!(Payment::default().total(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_returnable_quantity() {
        let mut item = line_item("A", 5, dec!(1), 0, None, dec!(5));
        assert_eq!(item.returnable_quantity(), 5);
        item.returned_quantity = 3;
        assert_eq!(item.returnable_quantity(), 2);
    }

    #[test]
    fn test_draft_sale_reports_not_returned() {
        let mut item = line_item("A", 2, dec!(1), 0, None, dec!(2));
        item.returned_quantity = 2;
        let sale = sale(vec![item], 2, dec!(2));
        assert_eq!(sale.return_state(), ReturnState::NotReturned);
    }

    #[test]
    fn test_product_sellable() {
        let mut p = product("A", dec!(10), dec!(5));
        assert!(p.is_sellable());
        p.enabled = false;
        assert!(!p.is_sellable());
    }
}
