//! # Sale Requests
//!
//! What a caller submits. Every numeric field is the caller's claim and is
//! verified before a [`Sale`](crate::types::Sale) is ever built from it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money;
use crate::types::{LineItem, Payment};

/// A submitted sale, for create or update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub customer_id: Option<String>,
    pub total_quantity: i64,
    #[ts(as = "Option<String>")]
    pub total_amount: Option<Decimal>,
    pub items: Vec<LineItemRequest>,
    pub payment: Option<PaymentRequest>,
}

impl SaleRequest {
    /// The submitted total amount, required for verification.
    pub fn require_total_amount(&self) -> CoreResult<Decimal> {
        self.total_amount.ok_or_else(|| {
            ValidationError::Required {
                field: "total_amount".to_string(),
            }
            .into()
        })
    }
}

/// A submitted line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "Option<String>")]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percent: i32,
    #[ts(as = "Option<String>")]
    pub discount_flat: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub line_total: Option<Decimal>,
}

impl LineItemRequest {
    #[inline]
    pub fn discount_flat_or_zero(&self) -> Decimal {
        money::or_zero(self.discount_flat)
    }

    /// Builds the line item once the request has been verified.
    pub fn to_line_item(&self, sale_id: &str, id: String) -> CoreResult<LineItem> {
        let unit_price = self.unit_price.ok_or_else(|| ValidationError::Required {
            field: "unit_price".to_string(),
        })?;
        let line_total = self.line_total.ok_or_else(|| ValidationError::Required {
            field: "line_total".to_string(),
        })?;

        Ok(LineItem {
            id,
            sale_id: sale_id.to_string(),
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            returned_quantity: 0,
            unit_price,
            discount_percent: self.discount_percent,
            discount_flat: self.discount_flat,
            line_total,
        })
    }
}

impl From<&LineItem> for LineItemRequest {
    /// A stored line item restated as a request, for re-verification.
    fn from(item: &LineItem) -> Self {
        LineItemRequest {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price: Some(item.unit_price),
            discount_percent: item.discount_percent,
            discount_flat: item.discount_flat,
            line_total: Some(item.line_total),
        }
    }
}

/// A submitted payment split. Absent components count as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
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

impl PaymentRequest {
    pub fn to_payment(&self, sale_id: &str) -> Payment {
        Payment {
            sale_id: sale_id.to_string(),
            cash_amount: self.cash_amount,
            credit_card_amount: self.credit_card_amount,
            credit_card_reference: self.credit_card_reference.clone(),
            qr_amount: self.qr_amount,
            qr_reference: self.qr_reference.clone(),
            cheque_amount: self.cheque_amount,
            cheque_reference: self.cheque_reference.clone(),
            due_amount: self.due_amount,
        }
    }

    /// Components as (field name, amount), for validation.
    pub fn named_components(&self) -> [(&'static str, Option<Decimal>); 5] {
        [
            ("cash_amount", self.cash_amount),
            ("credit_card_amount", self.credit_card_amount),
            ("qr_amount", self.qr_amount),
            ("cheque_amount", self.cheque_amount),
            ("due_amount", self.due_amount),
        ]
    }
}

/// A request to return part of one line item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    pub sale_id: String,
    pub line_item_id: String,
    pub quantity: i64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stored_item_restates_as_request() {
        let request = LineItemRequest {
            product_id: "P-1".to_string(),
            quantity: 3,
            unit_price: Some(dec!(500.00)),
            discount_percent: 10,
            discount_flat: Some(dec!(20.00)),
            line_total: Some(dec!(1290.00)),
        };
        let item = request.to_line_item("S-1", "L-1".to_string()).unwrap();

        let restated = LineItemRequest::from(&item);
        assert_eq!(restated.unit_price, Some(dec!(500.00)));
        assert_eq!(restated.line_total, Some(dec!(1290.00)));
        assert_eq!(restated.discount_percent, 10);
    }

    #[test]
    fn test_to_line_item_requires_prices() {
        let request = LineItemRequest {
            product_id: "P-1".to_string(),
            quantity: 2,
            unit_price: Some(dec!(3)),
            line_total: None,
            ..Default::default()
        };
        let err = request.to_line_item("sale-1", "line-1".to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_deserialize_defaults_discount_percent() {
        let json = r#"{"product_id":"P-1","quantity":1,"unit_price":"9.99","discount_flat":null,"line_total":"9.99"}"#;
        let request: LineItemRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.discount_percent, 0);
        assert_eq!(request.unit_price, Some(dec!(9.99)));
    }

    #[test]
    fn test_missing_total_amount() {
        let request = SaleRequest::default();
        assert_eq!(
            request.require_total_amount().unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
