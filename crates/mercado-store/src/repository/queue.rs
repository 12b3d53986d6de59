//! # POS Queue Repository
//!
//! The durable local side of the offline POS: the auto-keyed sale queue and
//! the product cache. This store is exclusively owned by the POS client
//! process.
//!
//! ## Queue Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enqueue           → INSERT, auto key, no network dependency            │
//! │  snapshot          → SELECT * ORDER BY key (read-only)                  │
//! │  remove(keys)      → DELETE exactly the submitted keys after the order  │
//! │                      store acknowledged the batch — sales enqueued      │
//! │                      during the round-trip keep their rows              │
//! │  clear             → operator escape hatch after shift-close review     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use mercado_core::{PosSale, Product, QueuedSale};

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    key: i64,
    payload: String,
}

/// Repository for the POS sale queue and product cache.
#[derive(Debug, Clone)]
pub struct QueueRepository {
    pool: SqlitePool,
}

impl QueueRepository {
    /// Creates a new QueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QueueRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Sale Queue
    // -------------------------------------------------------------------------

    /// Appends a sale to the queue and returns its auto-assigned key.
    pub async fn append_sale(&self, sale: &PosSale) -> StoreResult<i64> {
        let payload = serde_json::to_string(sale)?;

        let result = sqlx::query(
            r#"
            INSERT INTO sale_queue (payload, queued_at) VALUES (?1, ?2)
            "#,
        )
        .bind(&payload)
        .bind(sale.queued_at)
        .execute(&self.pool)
        .await?;

        let key = result.last_insert_rowid();
        debug!(key, total = sale.total_cents, "Sale queued");
        Ok(key)
    }

    /// All queued sales in key order.
    pub async fn snapshot(&self) -> StoreResult<Vec<QueuedSale>> {
        let rows: Vec<QueueRow> =
            sqlx::query_as("SELECT key, payload FROM sale_queue ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                let sale: PosSale = serde_json::from_str(&row.payload)?;
                Ok(QueuedSale { key: row.key, sale })
            })
            .collect()
    }

    /// Deletes exactly the given keys, in one transaction.
    pub async fn remove(&self, keys: &[i64]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("DELETE FROM sale_queue WHERE key = ?1")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(count = keys.len(), "Queue rows removed after sync ack");
        Ok(())
    }

    /// Deletes every queued sale. Operator-triggered, after the end-of-shift
    /// report has been reviewed.
    pub async fn clear(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM sale_queue")
            .execute(&self.pool)
            .await?;

        debug!("Sale queue cleared manually");
        Ok(())
    }

    /// Number of sales waiting to sync.
    pub async fn pending_count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Product Cache
    // -------------------------------------------------------------------------

    /// Replaces the cached catalog with the given products.
    pub async fn cache_put_all(&self, products: &[Product]) -> StoreResult<()> {
        let now: DateTime<Utc> = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM product_cache")
            .execute(&mut *tx)
            .await?;

        for product in products {
            sqlx::query(
                r#"
                INSERT INTO product_cache (id, payload, cached_at) VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(&product.id)
            .bind(serde_json::to_string(product)?)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(count = products.len(), "Product cache refreshed");
        Ok(())
    }

    /// All cached products.
    pub async fn cache_get_all(&self) -> StoreResult<Vec<Product>> {
        let payloads: Vec<String> =
            sqlx::query_scalar("SELECT payload FROM product_cache ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        payloads
            .into_iter()
            .map(|payload| Ok(serde_json::from_str(&payload)?))
            .collect()
    }

    /// Drops the cached catalog.
    pub async fn cache_clear(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM product_cache")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
