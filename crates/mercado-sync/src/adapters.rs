//! # SQLite Port Adapters
//!
//! Implementations of the queue/cache/sink ports over mercado-store
//! repositories. The embedded deployment wires these in; a network-backed
//! deployment swaps `StoreOrderSink`/`StoreCatalogSource` for HTTP-backed
//! ones without touching the queue engine.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use mercado_core::{MovementType, Order, PosSale, Product, QueuedSale, StockMovement};
use mercado_store::Database;

use crate::error::{SyncError, SyncResult};
use crate::ports::{CatalogSource, OrderSink, ProductCacheStore, QueueStore};

// =============================================================================
// Local Queue Store
// =============================================================================

/// The sale queue persisted in the register's embedded SQLite database.
#[derive(Clone)]
pub struct SqliteQueueStore {
    db: Database,
}

impl SqliteQueueStore {
    pub fn new(db: Database) -> Self {
        SqliteQueueStore { db }
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn append(&self, sale: &PosSale) -> SyncResult<i64> {
        Ok(self.db.queue().append_sale(sale).await?)
    }

    async fn snapshot(&self) -> SyncResult<Vec<QueuedSale>> {
        Ok(self.db.queue().snapshot().await?)
    }

    async fn remove(&self, keys: &[i64]) -> SyncResult<()> {
        Ok(self.db.queue().remove(keys).await?)
    }

    async fn clear(&self) -> SyncResult<()> {
        Ok(self.db.queue().clear().await?)
    }

    async fn pending_count(&self) -> SyncResult<i64> {
        Ok(self.db.queue().pending_count().await?)
    }
}

// =============================================================================
// Local Product Cache Store
// =============================================================================

/// The product cache persisted alongside the sale queue.
#[derive(Clone)]
pub struct SqliteProductCache {
    db: Database,
}

impl SqliteProductCache {
    pub fn new(db: Database) -> Self {
        SqliteProductCache { db }
    }
}

#[async_trait]
impl ProductCacheStore for SqliteProductCache {
    async fn put_all(&self, products: &[Product]) -> SyncResult<()> {
        Ok(self.db.queue().cache_put_all(products).await?)
    }

    async fn get_all(&self) -> SyncResult<Vec<Product>> {
        Ok(self.db.queue().cache_get_all().await?)
    }

    async fn clear(&self) -> SyncResult<()> {
        Ok(self.db.queue().cache_clear().await?)
    }
}

// =============================================================================
// Central Order Store Sink
// =============================================================================

/// Order sink writing straight into the shared order store.
///
/// Every submission mints fresh order ids and lands in one transaction, so
/// the batch-create is an independent append — the idempotent-retry
/// guarantee the queue relies on. Each synced sale is born `Entregado` on
/// both axes and decrements stock through `sale-pos` movements.
#[derive(Clone)]
pub struct StoreOrderSink {
    db: Database,
}

impl StoreOrderSink {
    pub fn new(db: Database) -> Self {
        StoreOrderSink { db }
    }
}

#[async_trait]
impl OrderSink for StoreOrderSink {
    async fn create_orders_batch(&self, sales: &[PosSale]) -> SyncResult<usize> {
        let now = Utc::now();

        let batch: Vec<(Order, Vec<StockMovement>)> = sales
            .iter()
            .map(|sale| {
                let order = Order::from_pos_sale(sale, Uuid::new_v4().to_string(), now);
                let reason = format!("Venta POS #{}", short_id(&order.id));
                let movements = order
                    .items
                    .iter()
                    .map(|line| {
                        StockMovement::new(
                            Uuid::new_v4().to_string(),
                            line.product_id.clone(),
                            -line.quantity,
                            MovementType::SalePos,
                            Some(reason.clone()),
                            now,
                        )
                    })
                    .collect();
                (order, movements)
            })
            .collect();

        self.db
            .orders()
            .create_orders_batch(&batch)
            .await
            // From the queue's perspective the central store is a remote
            // collaborator: any failure means "not acknowledged, retry".
            .map_err(|err| SyncError::SinkUnavailable(err.to_string()))
    }
}

// =============================================================================
// Catalog Source
// =============================================================================

/// Catalog source reading the shared product table.
#[derive(Clone)]
pub struct StoreCatalogSource {
    db: Database,
}

impl StoreCatalogSource {
    pub fn new(db: Database) -> Self {
        StoreCatalogSource { db }
    }
}

#[async_trait]
impl CatalogSource for StoreCatalogSource {
    async fn fetch_products(&self) -> SyncResult<Vec<Product>> {
        self.db
            .products()
            .list_active()
            .await
            .map_err(|err| SyncError::SinkUnavailable(err.to_string()))
    }
}

/// Last six characters of an id, for human-facing references.
fn short_id(id: &str) -> &str {
    let len = id.len();
    &id[len.saturating_sub(6)..]
}
