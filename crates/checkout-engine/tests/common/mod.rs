//! Fake collaborators for engine tests.
//!
//! Everything is in memory and synchronous apart from the optional stalls,
//! so tests can run with a paused clock.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checkout_core::{
    LineItemRequest, PaymentRequest, Product, Sale, SaleRequest, SaleReturn, SaleStatus,
};
use checkout_db::{DbError, DbResult};
use checkout_engine::{
    CollaboratorError, EngineConfig, InventoryControl, ProductLookup, SaleService, SaleStore,
};
use rust_decimal::Decimal;

/// Long enough to hit any configured timeout.
const STALL: Duration = Duration::from_secs(3600);

// =============================================================================
// Catalogue
// =============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    by_id: Mutex<HashMap<String, Product>>,
    by_code: Mutex<HashMap<String, Product>>,
    stalled: AtomicBool,
}

impl FakeCatalog {
    pub fn with(products: Vec<Product>) -> Arc<Self> {
        let catalog = Self::default();
        for product in products {
            catalog.put(product);
        }
        Arc::new(catalog)
    }

    /// Same record under both id and code.
    pub fn put(&self, product: Product) {
        self.by_code
            .lock()
            .unwrap()
            .insert(product.product_code.clone(), product.clone());
        self.by_id.lock().unwrap().insert(product.id.clone(), product);
    }

    /// Replaces only what the code lookup returns.
    pub fn put_code_record(&self, product: Product) {
        self.by_code
            .lock()
            .unwrap()
            .insert(product.product_code.clone(), product);
    }

    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    async fn maybe_stall(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
    }
}

#[async_trait]
impl ProductLookup for FakeCatalog {
    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, CollaboratorError> {
        self.maybe_stall().await;
        Ok(self.by_id.lock().unwrap().get(id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Product>, CollaboratorError> {
        self.maybe_stall().await;
        Ok(self.by_code.lock().unwrap().get(code).cloned())
    }
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryCall {
    Check(String, i64),
    Decrement(String, i64),
    Increment(String, i64),
}

/// Inventory that records every call in order.
#[derive(Default)]
pub struct FakeInventory {
    stock: Mutex<HashMap<String, i64>>,
    calls: Mutex<Vec<InventoryCall>>,
    failing_decrements: Mutex<HashSet<String>>,
    failing_increments: AtomicBool,
    stalled_checks: AtomicBool,
}

impl FakeInventory {
    pub fn with_stock(levels: &[(&str, i64)]) -> Arc<Self> {
        let inventory = Self::default();
        {
            let mut stock = inventory.stock.lock().unwrap();
            for (id, level) in levels {
                stock.insert(id.to_string(), *level);
            }
        }
        Arc::new(inventory)
    }

    pub fn stock(&self, product_id: &str) -> i64 {
        self.stock
            .lock()
            .unwrap()
            .get(product_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<InventoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn decrements(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, InventoryCall::Decrement(..)))
            .count()
    }

    pub fn increments(&self) -> Vec<InventoryCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, InventoryCall::Increment(..)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_decrement(&self, product_id: &str) {
        self.failing_decrements
            .lock()
            .unwrap()
            .insert(product_id.to_string());
    }

    pub fn fail_increments(&self) {
        self.failing_increments.store(true, Ordering::SeqCst);
    }

    pub fn stall_checks(&self) {
        self.stalled_checks.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: InventoryCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InventoryControl for FakeInventory {
    async fn check_available(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Result<bool, CollaboratorError> {
        self.record(InventoryCall::Check(product_id.to_string(), quantity));
        if self.stalled_checks.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        Ok(self.stock(product_id) >= quantity)
    }

    async fn decrement(&self, product_id: &str, quantity: i64) -> Result<(), CollaboratorError> {
        self.record(InventoryCall::Decrement(product_id.to_string(), quantity));
        if self.failing_decrements.lock().unwrap().contains(product_id) {
            return Err(CollaboratorError::Unavailable("connection reset".into()));
        }

        let mut stock = self.stock.lock().unwrap();
        let level = stock.entry(product_id.to_string()).or_insert(0);
        if *level < quantity {
            return Err(CollaboratorError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
            });
        }
        *level -= quantity;
        Ok(())
    }

    async fn increment(&self, product_id: &str, quantity: i64) -> Result<(), CollaboratorError> {
        self.record(InventoryCall::Increment(product_id.to_string(), quantity));
        if self.failing_increments.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("connection reset".into()));
        }
        *self
            .stock
            .lock()
            .unwrap()
            .entry(product_id.to_string())
            .or_insert(0) += quantity;
        Ok(())
    }
}

// =============================================================================
// Sale Store
// =============================================================================

/// Sale store with the same draft guards as the SQLite one.
#[derive(Default)]
pub struct MemoryStore {
    sales: Mutex<HashMap<String, Sale>>,
    returns: Mutex<Vec<SaleReturn>>,
    failing_updates: AtomicBool,
    failing_returns: AtomicBool,
    stalled_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.sales.lock().unwrap().len()
    }

    pub fn stored(&self, sale_id: &str) -> Option<Sale> {
        self.sales.lock().unwrap().get(sale_id).cloned()
    }

    pub fn fail_updates(&self) {
        self.failing_updates.store(true, Ordering::SeqCst);
    }

    pub fn fail_returns(&self) {
        self.failing_returns.store(true, Ordering::SeqCst);
    }

    pub fn stall_updates(&self) {
        self.stalled_updates.store(true, Ordering::SeqCst);
    }

    fn guard_draft(sales: &HashMap<String, Sale>, sale_id: &str) -> DbResult<()> {
        match sales.get(sale_id) {
            None => Err(DbError::not_found("Sale", sale_id)),
            Some(s) if s.status != SaleStatus::Draft => {
                Err(DbError::conflict("Sale", sale_id, "sale is not a draft"))
            }
            Some(_) => Ok(()),
        }
    }
}

fn io_error() -> DbError {
    DbError::QueryFailed("disk I/O error".into())
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        self.sales
            .lock()
            .unwrap()
            .insert(sale.id.clone(), sale.clone());
        Ok(())
    }

    async fn update_draft(&self, sale: &Sale) -> DbResult<()> {
        if self.stalled_updates.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        if self.failing_updates.load(Ordering::SeqCst) {
            return Err(io_error());
        }
        let mut sales = self.sales.lock().unwrap();
        Self::guard_draft(&sales, &sale.id)?;
        sales.insert(sale.id.clone(), sale.clone());
        Ok(())
    }

    async fn load_sale(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        Ok(self.stored(sale_id))
    }

    async fn delete_draft(&self, sale_id: &str) -> DbResult<()> {
        let mut sales = self.sales.lock().unwrap();
        Self::guard_draft(&sales, sale_id)?;
        sales.remove(sale_id);
        Ok(())
    }

    async fn save_return(
        &self,
        sale_return: &SaleReturn,
        sale_updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        if self.failing_returns.load(Ordering::SeqCst) {
            return Err(io_error());
        }

        let mut sales = self.sales.lock().unwrap();
        let sale = sales
            .get_mut(&sale_return.sale_id)
            .ok_or_else(|| DbError::not_found("Sale", &sale_return.sale_id))?;
        if sale.status != SaleStatus::Finalized {
            return Err(DbError::conflict("Sale", &sale.id, "not finalized"));
        }

        let item = sale
            .items
            .iter_mut()
            .find(|i| i.id == sale_return.line_item_id)
            .ok_or_else(|| DbError::not_found("Line item", &sale_return.line_item_id))?;
        if item.returned_quantity + sale_return.quantity > item.quantity {
            return Err(DbError::conflict("Line item", &item.id, "over-returned"));
        }
        item.returned_quantity += sale_return.quantity;
        sale.updated_at = sale_updated_at;

        self.returns.lock().unwrap().push(sale_return.clone());
        Ok(())
    }

    async fn load_returns_by_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>> {
        Ok(self
            .returns
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.sale_id == sale_id)
            .cloned()
            .collect())
    }

    async fn sales_by_status(&self, status: SaleStatus) -> DbResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .sales
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect();
        sales.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(sales)
    }

    async fn sales_by_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .sales
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.customer_id.as_deref() == Some(customer_id))
            .cloned()
            .collect();
        sales.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(sales)
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn product(id: &str, code: &str, price: Decimal, min_price: Decimal) -> Product {
    Product {
        id: id.to_string(),
        product_code: code.to_string(),
        name: format!("Product {}", code),
        price,
        min_price,
        enabled: true,
        deleted: false,
    }
}

pub fn item(
    product_id: &str,
    quantity: i64,
    unit_price: Decimal,
    discount_percent: i32,
    discount_flat: Option<Decimal>,
    line_total: Decimal,
) -> LineItemRequest {
    LineItemRequest {
        product_id: product_id.to_string(),
        quantity,
        unit_price: Some(unit_price),
        discount_percent,
        discount_flat,
        line_total: Some(line_total),
    }
}

pub fn request(items: Vec<LineItemRequest>, total_quantity: i64, total_amount: Decimal) -> SaleRequest {
    SaleRequest {
        customer_id: None,
        total_quantity,
        total_amount: Some(total_amount),
        items,
        payment: None,
    }
}

pub fn cash(amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        cash_amount: Some(amount),
        ..Default::default()
    }
}

/// Config with a short collaborator timeout.
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.collaborators.timeout_ms = 100;
    config
}

pub fn service(
    catalog: &Arc<FakeCatalog>,
    inventory: &Arc<FakeInventory>,
    store: &Arc<MemoryStore>,
) -> SaleService {
    SaleService::new(
        catalog.clone(),
        inventory.clone(),
        store.clone(),
        &test_config(),
    )
}
