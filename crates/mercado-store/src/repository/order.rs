//! # Order Repository
//!
//! Database operations for orders, their frozen line items, and the
//! transactional application of fulfillment transitions.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 SINGLE TRANSACTION (every transition)                   │
//! │                                                                         │
//! │  1. UPDATE orders SET status = ?, fulfillment_status = ?, ...          │
//! │     WHERE id = ? AND status = <expected> AND fulfillment = <expected>  │
//! │                                                                         │
//! │  2. INSERT INTO stock_movements ... (per affected item)                │
//! │     UPDATE products SET stock = stock + ? ...                          │
//! │                                                                         │
//! │  Guarded UPDATE: zero rows affected means the order moved under us —   │
//! │  the whole transaction rolls back and nothing is half-applied.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Multiple clients (POS terminals, storefront) share this store, but every
//! write is an append or a guarded transition — never a bulk overwrite — so
//! concurrent writers cannot lose each other's updates.

use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repository::ledger::insert_movement_tx;
use mercado_core::{
    Address, BundleOffer, CartLine, Channel, Discount, FulfillmentStatus, Order, OrderStatus,
    PaymentMethod, ReturnRecord, StockMovement, Transition, TransitionStamp,
};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    service_fee_cents: i64,
    discount_code: Option<String>,
    discount_cents: Option<i64>,
    total_cents: i64,
    status: String,
    fulfillment_status: String,
    channel: String,
    payment_method: Option<String>,
    delivery_address: Option<String>,
    delivery_notes: Option<String>,
    despachador_id: Option<String>,
    repartidor_id: Option<String>,
    created_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    picked_up_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<CartLine>) -> StoreResult<Order> {
        let status: OrderStatus = self.status.parse().map_err(StoreError::CorruptPayload)?;
        let fulfillment_status: FulfillmentStatus = self
            .fulfillment_status
            .parse()
            .map_err(StoreError::CorruptPayload)?;
        let channel: Channel = self.channel.parse().map_err(StoreError::CorruptPayload)?;
        let payment_method = self
            .payment_method
            .map(|m| m.parse::<PaymentMethod>().map_err(StoreError::CorruptPayload))
            .transpose()?;
        let delivery_address: Option<Address> = self
            .delivery_address
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        let discount = match (self.discount_code, self.discount_cents) {
            (Some(code), Some(amount_cents)) => Some(Discount { code, amount_cents }),
            _ => None,
        };

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            subtotal_cents: self.subtotal_cents,
            delivery_fee_cents: self.delivery_fee_cents,
            service_fee_cents: self.service_fee_cents,
            discount,
            total_cents: self.total_cents,
            status,
            fulfillment_status,
            channel,
            payment_method,
            delivery_address,
            delivery_notes: self.delivery_notes,
            despachador_id: self.despachador_id,
            repartidor_id: self.repartidor_id,
            created_at: self.created_at,
            assigned_at: self.assigned_at,
            picked_up_at: self.picked_up_at,
            delivered_at: self.delivered_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    name_snapshot: String,
    unit_price_cents: i64,
    discount_bps: Option<u32>,
    bundle_offers: String,
    quantity: i64,
    cost_cents: i64,
    added_at: DateTime<Utc>,
}

impl TryFrom<OrderItemRow> for CartLine {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let bundle_offers: Vec<BundleOffer> = serde_json::from_str(&row.bundle_offers)?;

        Ok(CartLine {
            product_id: row.product_id,
            name: row.name_snapshot,
            unit_price_cents: row.unit_price_cents,
            discount_bps: row.discount_bps,
            bundle_offers,
            quantity: row.quantity,
            cost_cents: row.cost_cents,
            added_at: row.added_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, subtotal_cents, delivery_fee_cents, service_fee_cents, \
     discount_code, discount_cents, total_cents, status, fulfillment_status, channel, \
     payment_method, delivery_address, delivery_notes, despachador_id, repartidor_id, \
     created_at, assigned_at, picked_up_at, delivered_at";

const ITEM_COLUMNS: &str = "product_id, name_snapshot, unit_price_cents, discount_bps, \
     bundle_offers, quantity, cost_cents, added_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates an order together with its stock movements, atomically.
    ///
    /// This is the online checkout write path: the order, its frozen items
    /// and one negative `sale-online` movement per item all commit together
    /// (or not at all).
    pub async fn create_order(
        &self,
        order: &Order,
        movements: &[StockMovement],
    ) -> StoreResult<()> {
        debug!(id = %order.id, channel = %order.channel, "Creating order");

        let mut tx = self.pool.begin().await?;
        insert_order_tx(&mut tx, order).await?;
        for movement in movements {
            insert_movement_tx(&mut tx, movement).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Creates a batch of orders (POS sync) in one transaction.
    ///
    /// The batch is an independent append: every order carries a fresh id,
    /// so retrying a failed batch can never collide with or duplicate a
    /// previous attempt that was not acknowledged.
    ///
    /// Returns the number of orders created.
    pub async fn create_orders_batch(
        &self,
        batch: &[(Order, Vec<StockMovement>)],
    ) -> StoreResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        debug!(count = batch.len(), "Creating order batch");

        let mut tx = self.pool.begin().await?;
        for (order, movements) in batch {
            insert_order_tx(&mut tx, order).await?;
            for movement in movements {
                insert_movement_tx(&mut tx, movement).await?;
            }
        }
        tx.commit().await?;

        Ok(batch.len())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an order (with its items) by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items_for(id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    /// One page of all orders, newest first, plus the total count.
    pub async fn list_page(&self, page: u32, limit: u32) -> StoreResult<(Vec<Order>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let orders = self.hydrate(rows).await?;
        Ok((orders, total))
    }

    /// Every order, newest first. Reporting reads whole ledgers at this
    /// scale; the paged listing serves the back-office UI.
    pub async fn list_all(&self) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// A user's order history, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Picked orders waiting for a rider (complete or with missing items).
    pub async fn pickup_queue(&self) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE fulfillment_status IN ('Listo para despacho', 'Listo con faltantes') \
               AND repartidor_id IS NULL \
             ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Orders currently out with a given rider.
    pub async fn rider_orders(&self, repartidor_id: &str) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE repartidor_id = ?1 AND status = 'En camino' \
             ORDER BY created_at, id"
        ))
        .bind(repartidor_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Orders a dispatcher is currently picking.
    pub async fn dispatcher_orders(&self, despachador_id: &str) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE despachador_id = ?1 AND fulfillment_status = 'En preparación' \
             ORDER BY created_at, id"
        ))
        .bind(despachador_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Applies a computed fulfillment transition, atomically with its ledger
    /// side effects.
    ///
    /// The UPDATE is guarded on the state pair the transition was computed
    /// from; if the order was transitioned concurrently the guard misses,
    /// everything rolls back, and `Conflict` is returned — the caller may
    /// re-read and retry.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_transition(
        &self,
        order_id: &str,
        expected_status: OrderStatus,
        expected_fulfillment: FulfillmentStatus,
        transition: &Transition,
        despachador_id: Option<&str>,
        repartidor_id: Option<&str>,
        movements: &[StockMovement],
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        debug!(
            order_id,
            status = %transition.status,
            fulfillment = %transition.fulfillment,
            "Applying fulfillment transition"
        );

        let (assigned_at, picked_up_at, delivered_at) = match transition.stamp {
            Some(TransitionStamp::Assigned) => (Some(now), None, None),
            Some(TransitionStamp::PickedUp) => (None, Some(now), None),
            Some(TransitionStamp::Delivered) => (None, None, Some(now)),
            None => (None, None, None),
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?4,
                fulfillment_status = ?5,
                despachador_id = COALESCE(?6, despachador_id),
                repartidor_id = COALESCE(?7, repartidor_id),
                assigned_at = COALESCE(?8, assigned_at),
                picked_up_at = COALESCE(?9, picked_up_at),
                delivered_at = COALESCE(?10, delivered_at)
            WHERE id = ?1 AND status = ?2 AND fulfillment_status = ?3
            "#,
        )
        .bind(order_id)
        .bind(expected_status.as_str())
        .bind(expected_fulfillment.as_str())
        .bind(transition.status.as_str())
        .bind(transition.fulfillment.as_str())
        .bind(despachador_id)
        .bind(repartidor_id)
        .bind(assigned_at)
        .bind(picked_up_at)
        .bind(delivered_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::conflict("Order", order_id));
        }

        for movement in movements {
            insert_movement_tx(&mut tx, movement).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Applies a return: the order flips to `Devuelto`, the return record is
    /// appended, and the per-item ledger entries land — all in one
    /// transaction.
    pub async fn apply_return(
        &self,
        expected_status: OrderStatus,
        record: &ReturnRecord,
        movements: &[StockMovement],
    ) -> StoreResult<()> {
        debug!(order_id = %record.order_id, refund = record.refund_cents, "Applying return");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET status = 'Devuelto'
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(&record.order_id)
        .bind(expected_status.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::conflict("Order", &record.order_id));
        }

        sqlx::query(
            r#"
            INSERT INTO returns (id, order_id, items, reason, restocked, refund_cents, channel, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.id)
        .bind(&record.order_id)
        .bind(serde_json::to_string(&record.items)?)
        .bind(&record.reason)
        .bind(record.restocked)
        .bind(record.refund_cents)
        .bind(record.channel.as_str())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        for movement in movements {
            insert_movement_tx(&mut tx, movement).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn items_for(&self, order_id: &str) -> StoreResult<Vec<CartLine>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY added_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn hydrate(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(&row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }
}

/// Inserts an order row and its item rows inside an open transaction.
async fn insert_order_tx(tx: &mut Transaction<'_, sqlx::Sqlite>, order: &Order) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, subtotal_cents, delivery_fee_cents, service_fee_cents,
            discount_code, discount_cents, total_cents, status, fulfillment_status,
            channel, payment_method, delivery_address, delivery_notes,
            despachador_id, repartidor_id,
            created_at, assigned_at, picked_up_at, delivered_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14,
            ?15, ?16,
            ?17, ?18, ?19, ?20
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.subtotal_cents)
    .bind(order.delivery_fee_cents)
    .bind(order.service_fee_cents)
    .bind(order.discount.as_ref().map(|d| d.code.clone()))
    .bind(order.discount.as_ref().map(|d| d.amount_cents))
    .bind(order.total_cents)
    .bind(order.status.as_str())
    .bind(order.fulfillment_status.as_str())
    .bind(order.channel.as_str())
    .bind(order.payment_method.map(|m| m.as_str()))
    .bind(
        order
            .delivery_address
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?,
    )
    .bind(&order.delivery_notes)
    .bind(&order.despachador_id)
    .bind(&order.repartidor_id)
    .bind(order.created_at)
    .bind(order.assigned_at)
    .bind(order.picked_up_at)
    .bind(order.delivered_at)
    .execute(&mut **tx)
    .await?;

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, name_snapshot, unit_price_cents,
                discount_bps, bundle_offers, quantity, cost_cents, added_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&order.id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.unit_price_cents)
        .bind(item.discount_bps)
        .bind(serde_json::to_string(&item.bundle_offers)?)
        .bind(item.quantity)
        .bind(item.cost_cents)
        .bind(item.added_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
