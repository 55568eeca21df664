//! # checkout-engine: Sale Lifecycle Orchestration
//!
//! Turns verified checkout requests into persisted sales, commits their
//! stock effect and reverses part of it on a return.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller (POS front end, API layer)                                      │
//! │       │  SaleRequest / PaymentRequest / ReturnRequest                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 checkout-engine (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   SaleService ──► SaleLocks (one mutex per sale id)            │   │
//! │  │       │                                                         │   │
//! │  │       ├──► checkout-core  validation, pricing, verifiers       │   │
//! │  │       ├──► ProductLookup ─────┐                                 │   │
//! │  │       ├──► StockCoordinator ──┼─► InventoryControl   (timeout)  │   │
//! │  │       └──► SaleStore          │                                 │   │
//! │  │                               ▼                                 │   │
//! │  │                LocalCatalog / remote services                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout-db (SQLite)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`orchestrator`] - `SaleService`, the lifecycle operations
//! - [`stock`] - availability-then-commit and compensation
//! - [`collaborators`] - traits the engine consumes, call timeouts
//! - [`catalog`] - local catalogue implementing the product and stock traits
//! - [`store`] - `SaleStore` for the SQLite database
//! - [`locks`] - per-sale serialization
//! - [`config`] - layered TOML + environment configuration
//! - [`telemetry`] - tracing subscriber setup
//! - [`error`] - engine error type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_engine::{EngineConfig, SaleService};
//!
//! checkout_engine::telemetry::init_tracing();
//! let config = EngineConfig::load_or_default(None);
//! let service = SaleService::open(&config).await?;
//!
//! let draft = service.create_sale(request).await?;
//! let sale = service.finalize_sale(&draft.id, payment).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod stock;
pub mod store;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::LocalCatalog;
pub use collaborators::{CollaboratorError, InventoryControl, ProductLookup, SaleStore};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use locks::SaleLocks;
pub use orchestrator::SaleService;
pub use stock::{CommittedDecrement, StockCoordinator};
