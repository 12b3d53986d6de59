//! # Storage & Sink Ports
//!
//! Object-safe async interfaces between the queue engine and its two
//! worlds: the register's local durable storage and the shared central
//! order store. The same queue logic runs unchanged against the embedded
//! SQLite adapters ([`crate::adapters`]) or a network-backed store; tests
//! script the ports to fail on demand.

use async_trait::async_trait;

use mercado_core::{PosSale, Product, QueuedSale};

use crate::error::SyncResult;

/// The register's local, durable, auto-keyed sale queue.
///
/// Exclusively owned by the POS client process. `append` must succeed with
/// no network available — it has no network dependency at all.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Appends a sale and returns its auto-assigned key.
    async fn append(&self, sale: &PosSale) -> SyncResult<i64>;

    /// All queued sales in key order.
    async fn snapshot(&self) -> SyncResult<Vec<QueuedSale>>;

    /// Deletes exactly the given keys.
    async fn remove(&self, keys: &[i64]) -> SyncResult<()>;

    /// Deletes every queued sale (manual reconciliation only).
    async fn clear(&self) -> SyncResult<()>;

    /// Number of sales waiting to sync.
    async fn pending_count(&self) -> SyncResult<i64>;
}

/// The central order store's batch-create contract.
///
/// `Ok(n)` is a positive acknowledgement that all `n` submitted sales are
/// durably persisted as orders. Anything less is an error, after which the
/// batch must be assumed NOT persisted — the store treats each submission
/// as an independent append with fresh order ids, so a retry can never
/// produce duplicates.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn create_orders_batch(&self, sales: &[PosSale]) -> SyncResult<usize>;
}

/// The catalog read side used to refresh the POS product cache.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> SyncResult<Vec<Product>>;
}

/// Local storage for the POS product cache.
#[async_trait]
pub trait ProductCacheStore: Send + Sync {
    /// Replaces the cached catalog.
    async fn put_all(&self, products: &[Product]) -> SyncResult<()>;

    /// All cached products.
    async fn get_all(&self) -> SyncResult<Vec<Product>>;

    /// Drops the cached catalog.
    async fn clear(&self) -> SyncResult<()>;
}
