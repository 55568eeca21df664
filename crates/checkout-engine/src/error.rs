//! # Engine Error Types
//!
//! Everything a [`SaleService`](crate::SaleService) operation can fail with.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Business rule  │  │  Collaborator   │  │      Storage            │ │
//! │  │  (CoreError)    │  │                 │  │   (DbError)             │ │
//! │  │                 │  │  Timeout        │  │                         │ │
//! │  │  *Mismatch      │  │  Unreachable    │  │  NotFound               │ │
//! │  │  ProductNot…    │  │                 │  │  Conflict → Illegal…    │ │
//! │  │  Insufficient…  │  │  → Dependency   │  │  anything else →        │ │
//! │  │  IllegalState…  │  │    Unavailable  │  │    Storage              │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant maps onto one [`ErrorKind`] through [`EngineError::kind`].

use checkout_core::{CoreError, ErrorKind};
use checkout_db::DbError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule refused the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A collaborator timed out or could not be reached.
    ///
    /// ## When This Occurs
    /// - The call exceeded `collaborators.timeout_ms`
    /// - The collaborator reported itself unavailable
    ///
    /// The caller may retry the whole operation.
    #[error("{collaborator} unavailable: {reason}")]
    DependencyUnavailable {
        collaborator: &'static str,
        reason: String,
    },

    /// The sale store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// Engine configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Shorthand for a collaborator failure.
    pub fn unavailable(collaborator: &'static str, reason: impl Into<String>) -> Self {
        EngineError::DependencyUnavailable {
            collaborator,
            reason: reason.into(),
        }
    }

    /// The taxonomy member this error reports as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(e) => e.kind(),
            EngineError::DependencyUnavailable { .. } => ErrorKind::DependencyUnavailable,
            EngineError::Storage(DbError::NotFound { .. }) => ErrorKind::NotFound,
            // Guarded writes lost a race with another state change
            EngineError::Storage(DbError::Conflict { .. }) => ErrorKind::IllegalStateTransition,
            EngineError::Storage(_) => ErrorKind::Storage,
            EngineError::Config(_) => ErrorKind::InvalidInput,
        }
    }

    /// True when the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
