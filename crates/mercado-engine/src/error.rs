//! # Engine Error Types
//!
//! Errors surfaced by the service layer. Three families, handled
//! differently by callers:
//!
//! - **Core** — business rule violations (invalid transition, empty cart,
//!   over-returning). Immediate rejections; nothing was applied.
//! - **Store** — persistence failures. Recoverable; a failed transition is
//!   a no-op and safe to retry.
//! - **Not found** — the referenced order/product does not exist. Distinct
//!   from a store failure because retrying will not help.

use thiserror::Error;

use mercado_core::CoreError;
use mercado_store::StoreError;

/// Service layer errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation from the pure core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure from the store layer.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The referenced order does not exist.
    #[error("Pedido no encontrado: {0}")]
    OrderNotFound(String),

    /// The referenced product does not exist.
    #[error("Producto no encontrado: {0}")]
    ProductNotFound(String),
}

/// Result type for service operations.
pub type EngineResult<T> = Result<T, EngineError>;
