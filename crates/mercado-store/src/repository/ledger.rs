//! # Inventory Ledger Repository
//!
//! Append-only log of stock movements. The ledger is the sole source of
//! truth for stock quantity; `products.stock` is a cached value updated in
//! the same transaction as every movement, and can be reconciled against
//! the ledger at any time.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION (every movement)                   │
//! │                                                                         │
//! │  1. INSERT INTO stock_movements (product_id, quantity, type, ...)      │
//! │  2. UPDATE products SET stock = stock + quantity WHERE id = ?          │
//! │                                                                         │
//! │  Both succeed or both fail — the cache can lag the ledger by exactly   │
//! │  zero movements.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use mercado_core::{MovementType, StockMovement};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: String,
    product_id: String,
    quantity: i64,
    movement_type: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let movement_type: MovementType = row
            .movement_type
            .parse()
            .map_err(StoreError::CorruptPayload)?;

        Ok(StockMovement {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            movement_type,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Shared Transactional Insert
// =============================================================================

/// Inserts a movement and bumps the cached product stock inside an open
/// transaction. Used by every write path that touches stock: order
/// placement, POS batch creation, picking shortfalls, returns, operator
/// receptions and adjustments.
pub(crate) async fn insert_movement_tx(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    movement: &StockMovement,
) -> StoreResult<()> {
    // The cache bump doubles as the existence check: an unknown product is
    // reported as not-found before the ledger insert can trip the foreign
    // key.
    let result = sqlx::query(
        r#"
        UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3
        "#,
    )
    .bind(movement.quantity)
    .bind(movement.created_at)
    .bind(&movement.product_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("Product", &movement.product_id));
    }

    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, quantity, movement_type, reason, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.quantity)
    .bind(movement.movement_type.as_str())
    .bind(&movement.reason)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory ledger operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends a single movement and updates the cached stock, atomically.
    ///
    /// The ledger performs no business validation beyond a valid product
    /// reference and a non-zero quantity — the caller chooses sign and type.
    pub async fn record_movement(&self, movement: &StockMovement) -> StoreResult<()> {
        debug!(
            product_id = %movement.product_id,
            quantity = movement.quantity,
            movement_type = %movement.movement_type,
            "Recording stock movement"
        );

        let mut tx = self.pool.begin().await?;
        insert_movement_tx(&mut tx, movement).await?;
        tx.commit().await?;

        Ok(())
    }

    /// All movements for one product, oldest first.
    pub async fn movements_for_product(&self, product_id: &str) -> StoreResult<Vec<StockMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, quantity, movement_type, reason, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }

    /// Every movement in the ledger, oldest first.
    pub async fn all_movements(&self) -> StoreResult<Vec<StockMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, quantity, movement_type, reason, created_at
            FROM stock_movements
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }

    /// Current stock derived from the ledger: the sum of all movements for
    /// the product, in order.
    pub async fn current_stock(&self, product_id: &str) -> StoreResult<i64> {
        let sum: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(quantity) FROM stock_movements WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum.unwrap_or(0))
    }

    /// Returns `(cached, derived)` stock for a product so callers can verify
    /// the cache against the ledger.
    pub async fn reconcile(&self, product_id: &str) -> StoreResult<(i64, i64)> {
        let cached: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT stock FROM products WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        let cached = cached.ok_or_else(|| StoreError::not_found("Product", product_id))?;
        let derived = self.current_stock(product_id).await?;

        Ok((cached, derived))
    }

    /// Negative `adjustment` movements — the raw material of the spoilage
    /// report.
    pub async fn negative_adjustments(&self) -> StoreResult<Vec<StockMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, quantity, movement_type, reason, created_at
            FROM stock_movements
            WHERE movement_type = 'adjustment' AND quantity < 0
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }
}
