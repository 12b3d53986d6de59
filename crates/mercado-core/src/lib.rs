//! # mercado-core: Pure Business Logic for the Mercado Platform
//!
//! This crate is the heart of the Mercado retail commerce core. It contains
//! all business logic as pure functions and aggregates with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mercado Architecture                              │
//! │                                                                         │
//! │  Storefront / POS terminal / Back-office (TypeScript, out of scope)    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              mercado-engine / mercado-sync                      │   │
//! │  │      checkout, fulfillment, inventory, offline queue            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mercado-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────┐ ┌─────────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │ pricing │ │ cart │ │ fulfillment │ │ money  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────┘ └─────────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, StockMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Bundle/discount pricing, cart totals, promo codes
//! - [`cart`] - The cart aggregate
//! - [`fulfillment`] - The order fulfillment transition table
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, same input = same output
//! 2. **No I/O**: database, network and file system access are forbidden here
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Explicit Errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod fulfillment;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use error::{CoreError, CoreResult, ValidationError};
pub use fulfillment::{apply_event, FulfillmentEvent, Transition, TransitionStamp};
pub use money::Money;
pub use pricing::{CartTotals, FinancialSummary, PosDiscount, SpoilageReport};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat delivery fee for online orders, in cents (Bs 10.00).
/// Applied only when the cart is non-empty; never applied to POS sales.
pub const DELIVERY_FEE_CENTS: i64 = 1000;

/// Service fee rate for online orders, in basis points (2%).
pub const SERVICE_FEE_BPS: u32 = 200;

/// Default cost basis when the catalog carries no explicit cost, in basis
/// points of the unit price (70%).
pub const DEFAULT_COST_BPS: u32 = 7000;

/// The one promo code the storefront currently honors, and its rate.
pub const PROMO10_CODE: &str = "PROMO10";
pub const PROMO10_BPS: u32 = 1000;

/// Sentinel user id attached to register sales. POS transactions have no
/// shopper account; orders created from the sale queue carry this id.
pub const POS_CUSTOMER_ID: &str = "pos-customer";

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
/// Catches typo-sized quantities (1000 instead of 10) before they price.
pub const MAX_ITEM_QUANTITY: i64 = 999;
