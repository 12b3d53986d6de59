//! # mercado-engine: Session & Back-Office Services
//!
//! Service objects orchestrating the pure core (`mercado-core`) against the
//! store (`mercado-store`):
//!
//! - [`session::CartSession`] — per-session cart owner
//! - [`checkout::CheckoutService`] — online order placement
//! - [`fulfillment::FulfillmentService`] — dispatcher/rider pipeline, returns
//! - [`inventory::InventoryService`] — receptions, adjustments, reconciliation
//! - [`reports::ReportingService`] — profit and spoilage reporting
//!
//! ## Construction
//! Each service is constructed once per process with an explicit `Database`
//! handle and passed by reference to whatever needs it:
//!
//! ```rust,ignore
//! let db = Database::new(StoreConfig::new("./mercado.db")).await?;
//! let checkout = CheckoutService::new(db.clone());
//! let fulfillment = FulfillmentService::new(db.clone());
//! ```
//!
//! There is no ambient global state; the presentation layer calls plain
//! methods on these objects.

pub mod checkout;
pub mod error;
pub mod fulfillment;
pub mod inventory;
pub mod reports;
pub mod session;

pub use checkout::CheckoutService;
pub use error::{EngineError, EngineResult};
pub use fulfillment::FulfillmentService;
pub use inventory::InventoryService;
pub use reports::ReportingService;
pub use session::CartSession;
