//! # Sale Lifecycle Orchestrator
//!
//! [`SaleService`] is the only way a sale changes state.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_sale ──► ┌─────────┐  finalize_sale  ┌───────────┐             │
//! │                   │  DRAFT  │ ──────────────► │ FINALIZED │ ◄─┐         │
//! │   update_sale ──► └─────────┘                 └───────────┘   │         │
//! │                        │                            │         │         │
//! │   delete_sale ◄────────┘              process_return └─────────┘         │
//! │                                       (derived view: partially /        │
//! │                                        fully returned, never stored)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Create / Update / Finalize Pipeline
//! ```text
//! request
//!   │ 1. shape validation (sale-wide)
//!   │ 2. per item: shape → lookup by id → lookup by code → verify
//!   │    (fail-fast per item, collect-all across items)
//!   │ 3. totals, and payment when present
//!   │ 4. finalize only: availability for every item, then decrement each
//!   ▼ 5. one store write
//! ```
//!
//! Nothing is written and no stock moves unless every earlier step passed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use checkout_core::error::rejections_to_result;
use checkout_core::item_verifier::verify_line_item;
use checkout_core::lifecycle::{ensure_can, ensure_returnable};
use checkout_core::pricing::refund_amount;
use checkout_core::sale_verifier::verify_sale;
use checkout_core::validation::{
    validate_line_item, validate_payment, validate_return_request, validate_sale_request,
    SaleLimits,
};
use checkout_core::{
    CoreError, CoreResult, ItemRejection, LineItem, LineItemRequest, Payment, PaymentRequest,
    Product, ReturnRequest, Sale, SaleOperation, SaleRequest, SaleReturn, SaleStatus,
};
use checkout_db::repository::sale::{generate_line_item_id, generate_sale_id};
use checkout_db::repository::sale_return::generate_return_id;
use checkout_db::{Database, DbResult};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::catalog::LocalCatalog;
use crate::collaborators::{bounded, CollaboratorError, InventoryControl, ProductLookup, SaleStore};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::locks::SaleLocks;
use crate::stock::StockCoordinator;

const CATALOGUE: &str = "catalogue";
const STORE: &str = "sale store";

/// A request that passed every check, ready to persist.
struct VerifiedSale {
    items: Vec<LineItem>,
    payment: Option<Payment>,
    total_amount: Decimal,
}

/// Sale lifecycle orchestrator.
pub struct SaleService {
    products: Arc<dyn ProductLookup>,
    stock: StockCoordinator,
    store: Arc<dyn SaleStore>,
    locks: SaleLocks,
    limits: SaleLimits,
    timeout: Duration,
}

impl SaleService {
    /// Wires the service to its collaborators.
    pub fn new(
        products: Arc<dyn ProductLookup>,
        inventory: Arc<dyn InventoryControl>,
        store: Arc<dyn SaleStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            products,
            stock: StockCoordinator::new(inventory, config.timeout()),
            store,
            locks: SaleLocks::new(),
            limits: config.limits(),
            timeout: config.timeout(),
        }
    }

    /// Opens the configured database and serves products and stock from
    /// its local catalogue.
    pub async fn open(config: &EngineConfig) -> EngineResult<Self> {
        let db = Database::new(config.db_config()).await?;
        let catalog = Arc::new(LocalCatalog::new(db.clone()));

        info!(path = ?config.database.path, "Sale service ready");
        Ok(Self::new(catalog.clone(), catalog, Arc::new(db), config))
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Verifies a request and stores it as a new DRAFT.
    ///
    /// Payment is optional at this point and only checked when given.
    pub async fn create_sale(&self, request: SaleRequest) -> EngineResult<Sale> {
        debug!(items = request.items.len(), "Creating sale");

        let sale_id = generate_sale_id();
        let verified = self.verify_request(&sale_id, &request).await?;

        let now = Utc::now();
        let sale = Sale {
            id: sale_id,
            customer_id: request.customer_id,
            status: SaleStatus::Draft,
            total_quantity: request.total_quantity,
            total_amount: verified.total_amount,
            items: verified.items,
            payment: verified.payment,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        };

        self.persist("insert_sale", self.store.insert_sale(&sale)).await?;

        info!(sale_id = %sale.id, total = %sale.total_amount, "Sale created");
        Ok(sale)
    }

    /// Replaces a DRAFT's contents after the same checks as create.
    pub async fn update_sale(&self, sale_id: &str, request: SaleRequest) -> EngineResult<Sale> {
        debug!(sale_id = %sale_id, items = request.items.len(), "Updating sale");

        let _guard = self.locks.acquire(sale_id).await;
        let existing = self.load_existing(sale_id).await?;
        ensure_can(&existing, SaleOperation::Update)?;

        let verified = self.verify_request(sale_id, &request).await?;

        let sale = Sale {
            customer_id: request.customer_id,
            total_quantity: request.total_quantity,
            total_amount: verified.total_amount,
            items: verified.items,
            payment: verified.payment,
            updated_at: Utc::now(),
            ..existing
        };

        self.persist("update_draft", self.store.update_draft(&sale)).await?;

        info!(sale_id = %sale.id, total = %sale.total_amount, "Sale updated");
        Ok(sale)
    }

    /// Finalizes a DRAFT: re-verifies it with the payment, commits stock
    /// for every item, then stores it as FINALIZED.
    ///
    /// ## Errors
    /// - Any verification kind, with nothing changed
    /// - `InsufficientStock` if any item is unavailable; no stock moves
    /// - `DependencyUnavailable` / `Storage` after compensating the stock
    ///   already committed; the sale stays DRAFT
    pub async fn finalize_sale(&self, sale_id: &str, payment: PaymentRequest) -> EngineResult<Sale> {
        debug!(sale_id = %sale_id, "Finalizing sale");

        let _guard = self.locks.acquire(sale_id).await;
        let draft = self.load_existing(sale_id).await?;
        ensure_can(&draft, SaleOperation::Finalize)?;

        validate_payment(&payment).map_err(CoreError::from)?;
        let requests: Vec<LineItemRequest> = draft.items.iter().map(LineItemRequest::from).collect();
        self.verify_items(&requests).await?;

        let payment = payment.to_payment(sale_id);
        verify_sale(
            &draft.items,
            draft.total_quantity,
            draft.total_amount,
            Some(&payment),
        )?;

        let committed = self.stock.commit_sale(sale_id, &draft.items).await?;

        let now = Utc::now();
        let sale = Sale {
            status: SaleStatus::Finalized,
            payment: Some(payment),
            updated_at: now,
            finalized_at: Some(now),
            ..draft
        };

        if let Err(e) = self.persist("update_draft", self.store.update_draft(&sale)).await {
            error!(sale_id = %sale_id, error = %e, "Failed to store finalized sale, releasing stock");
            self.stock.compensate(sale_id, &committed).await;
            return Err(e);
        }

        info!(sale_id = %sale.id, total = %sale.total_amount, "Sale finalized");
        Ok(sale)
    }

    /// Deletes a DRAFT. A finalized sale can only be returned against.
    pub async fn delete_sale(&self, sale_id: &str) -> EngineResult<()> {
        debug!(sale_id = %sale_id, "Deleting sale");

        {
            let _guard = self.locks.acquire(sale_id).await;
            let sale = self.load_existing(sale_id).await?;
            ensure_can(&sale, SaleOperation::Delete)?;
            self.persist("delete_draft", self.store.delete_draft(sale_id))
                .await?;
        }
        self.locks.forget(sale_id);

        info!(sale_id = %sale_id, "Sale deleted");
        Ok(())
    }

    /// Returns part of a FINALIZED line item and restocks it.
    ///
    /// The refund is the item's discounted unit price times the returned
    /// quantity.
    ///
    /// ## Errors
    /// - `IllegalStateTransition` unless the sale is FINALIZED
    /// - `TotalQuantityMismatch` if more than the remaining quantity is
    ///   requested
    /// - `DependencyUnavailable` if the restock fails; nothing is recorded
    pub async fn process_return(&self, request: ReturnRequest) -> EngineResult<SaleReturn> {
        debug!(
            sale_id = %request.sale_id,
            line_item_id = %request.line_item_id,
            quantity = request.quantity,
            "Processing return"
        );

        validate_return_request(&request).map_err(CoreError::from)?;

        let _guard = self.locks.acquire(&request.sale_id).await;
        let sale = self.load_existing(&request.sale_id).await?;
        let item = ensure_returnable(&sale, &request.line_item_id, request.quantity)?;
        let refund = refund_amount(item, request.quantity)?;

        self.stock
            .restore_on_return(&item.product_id, request.quantity)
            .await?;

        let now = Utc::now();
        let sale_return = SaleReturn {
            id: generate_return_id(),
            sale_id: sale.id.clone(),
            line_item_id: item.id.clone(),
            quantity: request.quantity,
            reason: request.reason,
            refund_amount: refund,
            return_date: now,
        };

        if let Err(e) = self
            .persist("save_return", self.store.save_return(&sale_return, now))
            .await
        {
            error!(sale_id = %sale.id, error = %e, "Failed to record return, taking restock back");
            self.stock
                .undo_restore(&sale.id, &item.product_id, request.quantity)
                .await;
            return Err(e);
        }

        info!(
            sale_id = %sale.id,
            line_item_id = %sale_return.line_item_id,
            quantity = sale_return.quantity,
            refund = %sale_return.refund_amount,
            "Return processed"
        );
        Ok(sale_return)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Sale by id.
    pub async fn get_sale(&self, sale_id: &str) -> EngineResult<Sale> {
        self.load_existing(sale_id).await
    }

    pub async fn sales_by_status(&self, status: SaleStatus) -> EngineResult<Vec<Sale>> {
        self.persist("sales_by_status", self.store.sales_by_status(status))
            .await
    }

    pub async fn sales_by_customer(&self, customer_id: &str) -> EngineResult<Vec<Sale>> {
        self.persist("sales_by_customer", self.store.sales_by_customer(customer_id))
            .await
    }

    /// Returns recorded against a sale, oldest first.
    pub async fn returns_for_sale(&self, sale_id: &str) -> EngineResult<Vec<SaleReturn>> {
        self.persist("load_returns_by_sale", self.store.load_returns_by_sale(sale_id))
            .await
    }

    // =========================================================================
    // Verification
    // =========================================================================

    async fn load_existing(&self, sale_id: &str) -> EngineResult<Sale> {
        self.persist("load_sale", self.store.load_sale(sale_id))
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Runs every check on a create/update request and materialises the
    /// line items and payment.
    async fn verify_request(&self, sale_id: &str, request: &SaleRequest) -> EngineResult<VerifiedSale> {
        validate_sale_request(request, &self.limits).map_err(CoreError::from)?;
        let total_amount = request.require_total_amount()?;

        self.verify_items(&request.items).await?;

        let items = request
            .items
            .iter()
            .map(|item| item.to_line_item(sale_id, generate_line_item_id()))
            .collect::<CoreResult<Vec<_>>>()?;
        let payment = request.payment.as_ref().map(|p| p.to_payment(sale_id));

        verify_sale(
            &items,
            request.total_quantity,
            total_amount,
            payment.as_ref(),
        )?;

        Ok(VerifiedSale {
            items,
            payment,
            total_amount,
        })
    }

    /// Verifies every item and reports all failures together.
    ///
    /// A collaborator outage aborts at once; it says nothing about the
    /// item itself.
    async fn verify_items(&self, items: &[LineItemRequest]) -> EngineResult<()> {
        let mut rejections = Vec::new();

        for (position, item) in items.iter().enumerate() {
            match self.verify_item(item).await {
                Ok(()) => {}
                Err(EngineError::Core(error)) => {
                    warn!(
                        position,
                        product_id = %item.product_id,
                        error = %error,
                        "Line item rejected"
                    );
                    rejections.push(ItemRejection {
                        position,
                        product_id: item.product_id.clone(),
                        error,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(rejections_to_result(rejections)?)
    }

    /// Shape, lookups and the item checks for one line, fail-fast.
    async fn verify_item(&self, item: &LineItemRequest) -> EngineResult<()> {
        validate_line_item(item, &self.limits).map_err(CoreError::from)?;

        let by_id = self
            .lookup("get_by_id", self.products.get_by_id(&item.product_id))
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

        let by_code = self
            .lookup("get_by_code", self.products.get_by_code(&by_id.product_code))
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(by_id.product_code.clone()))?;

        if by_id.id != by_code.id || by_id.is_sellable() != by_code.is_sellable() {
            warn!(
                product_id = %by_id.id,
                product_code = %by_id.product_code,
                code_resolves_to = %by_code.id,
                "Product id and code lookups disagree"
            );
        }

        Ok(verify_line_item(&by_id, &by_code, item)?)
    }

    async fn lookup<F>(&self, operation: &'static str, call: F) -> EngineResult<Option<Product>>
    where
        F: Future<Output = Result<Option<Product>, CollaboratorError>>,
    {
        bounded(operation, self.timeout, call)
            .await
            .map_err(|e| e.into_engine_error(CATALOGUE))
    }

    /// One store call under the collaborator timeout. A timeout is
    /// `DependencyUnavailable`; store errors keep their own kind.
    async fn persist<T, F>(&self, operation: &'static str, call: F) -> EngineResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        let result = bounded(operation, self.timeout, async { Ok(call.await) })
            .await
            .map_err(|e| e.into_engine_error(STORE))?;
        Ok(result?)
    }
}
