//! # mercado-sync: Offline POS Sale Queue
//!
//! The engine that keeps the register selling while the network is down:
//! finalized sales land in a durable local queue with zero network
//! dependency, and a background agent reconciles them with the central
//! order store — at startup, on a fixed interval, and on operator request.
//!
//! ## Guarantees
//! - A sale is never lost: it stays queued until the order store positively
//!   acknowledges the batch that contained it.
//! - A sale is never double-counted: only acknowledged batches are removed,
//!   removal targets exactly the submitted keys, and the store mints fresh
//!   order ids per submission — failed syncs retry cleanly.
//! - Sync failures are routine: they downgrade the status signal
//!   (`synced|syncing|offline`) and never abort the POS session.
//!
//! ## Wiring
//! ```rust,ignore
//! let store = Arc::new(SqliteQueueStore::new(local_db.clone()));
//! let sink = Arc::new(StoreOrderSink::new(central_db.clone()));
//! let queue = Arc::new(SaleQueue::new(store, sink));
//!
//! let agent = SyncAgent::spawn(queue.clone(), SyncAgentConfig::default(), listener);
//! // ... register runs, queue.enqueue(sale) per finalized sale ...
//! agent.shutdown().await; // cancel/replace on re-init
//! ```

pub mod adapters;
pub mod agent;
pub mod error;
pub mod ports;
pub mod product_cache;
pub mod queue;

pub use adapters::{SqliteProductCache, SqliteQueueStore, StoreCatalogSource, StoreOrderSink};
pub use agent::{
    NoOpListener, SyncAgent, SyncAgentConfig, SyncAgentHandle, SyncStatusListener,
    DEFAULT_SYNC_INTERVAL,
};
pub use error::{SyncError, SyncResult};
pub use ports::{CatalogSource, OrderSink, ProductCacheStore, QueueStore};
pub use product_cache::ProductCache;
pub use queue::{SaleQueue, SyncStatus};
