//! # Error Types
//!
//! Domain-specific error types for mercado-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError → CoreError → StoreError/SyncError → API layer → UI
//! ```
//!
//! Pricing and cart math never fail — they always produce a number, clamping
//! totals at zero. Only rule violations (invalid transition, unknown promo
//! code, over-returning) surface as `CoreError`; I/O failures live in the
//! store and sync crates.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
///
/// These are immediate, synchronous rejections: nothing is partially applied
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Promo code does not map to any discount policy.
    ///
    /// An unrecognized code is rejected rather than silently ignored, so the
    /// caller can tell the shopper.
    #[error("Código promocional no válido: {0}")]
    UnknownPromoCode(String),

    /// Cart has exceeded maximum allowed distinct items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The referenced product is not in the cart.
    #[error("Product {0} not in cart")]
    ProductNotInCart(String),

    /// Checkout requires a non-empty cart.
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    /// Online checkout requires a selected delivery address.
    #[error("A delivery address must be selected before placing the order")]
    MissingDeliveryAddress,

    /// A fulfillment event is not legal from the order's current state.
    /// The order is left completely unchanged.
    #[error("Cannot apply '{event}' while order is '{status}' / '{fulfillment}'")]
    InvalidTransition {
        status: &'static str,
        fulfillment: &'static str,
        event: &'static str,
    },

    /// A return asked for more units than were originally purchased.
    #[error("Cannot return {requested} of product {product_id}: only {purchased} purchased")]
    ReturnExceedsPurchase {
        product_id: String,
        requested: i64,
        purchased: i64,
    },

    /// A return referenced a product the order never contained.
    #[error("Product {0} is not part of the order")]
    ProductNotInOrder(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero (signed ledger quantities).
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
