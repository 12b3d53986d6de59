//! # mercado-store: Database Layer for the Mercado Platform
//!
//! SQLite persistence for the commerce core: products, orders, the
//! inventory ledger, delivery addresses, financial records, and the POS
//! sale queue.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mercado-engine / mercado-sync                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  mercado-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ order, ledger │    │  (embedded)  │  │   │
//! │  │   │   SqlitePool  │    │ product, ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercado_store::{Database, StoreConfig};
//!
//! let db = Database::new(StoreConfig::new("./mercado.db")).await?;
//! let page = db.products().fetch_page(1, 50).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Database, StoreConfig};

// Repository re-exports for convenience
pub use repository::address::AddressRepository;
pub use repository::financial::FinancialRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{ProductPage, ProductRepository};
pub use repository::queue::QueueRepository;
