//! # Checkout Service
//!
//! Online order placement.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(user, session, address)                                    │
//! │       │                                                                 │
//! │       ├── cart empty?          → EmptyCart, nothing applied             │
//! │       ├── no address selected? → MissingDeliveryAddress                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  snapshot cart lines + totals  (cost snapshots travel with the lines)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ONE TRANSACTION:                                                       │
//! │    orders row (Recibido / No preparado)                                 │
//! │    order_items rows                                                     │
//! │    one negative sale-online movement per line (+ stock cache update)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clear the cart — only after the commit                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use mercado_core::{
    Address, Channel, CoreError, FulfillmentStatus, MovementType, Order, OrderStatus,
    StockMovement,
};
use mercado_store::Database;

use crate::error::EngineResult;
use crate::session::CartSession;

/// Service for placing online orders.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Places an online order from the session's cart.
    ///
    /// Validation failures are rejected before anything is written. The
    /// order, its items and its stock movements commit atomically; the cart
    /// is cleared only after the store confirms the commit.
    pub async fn place_order(
        &self,
        user_id: &str,
        session: &CartSession,
        delivery_address: Option<Address>,
    ) -> EngineResult<Order> {
        let (lines, discount, totals) = session.with_cart(|cart| {
            (
                cart.snapshot_lines(),
                cart.discount().cloned(),
                cart.totals(Channel::Online),
            )
        });

        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        let address = delivery_address.ok_or(CoreError::MissingDeliveryAddress)?;

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let delivery_notes = if address.reference.is_empty() {
            None
        } else {
            Some(address.reference.clone())
        };

        let order = Order {
            id: id.clone(),
            user_id: user_id.to_string(),
            items: lines,
            subtotal_cents: totals.subtotal_cents,
            delivery_fee_cents: totals.delivery_fee_cents,
            service_fee_cents: totals.service_fee_cents,
            discount,
            total_cents: totals.total_cents,
            status: OrderStatus::Recibido,
            fulfillment_status: FulfillmentStatus::NoPreparado,
            channel: Channel::Online,
            payment_method: None,
            delivery_address: Some(address),
            delivery_notes,
            despachador_id: None,
            repartidor_id: None,
            created_at: now,
            assigned_at: None,
            picked_up_at: None,
            delivered_at: None,
        };

        let reason = format!("Pedido #{}", short_id(&order.id));
        let movements: Vec<StockMovement> = order
            .items
            .iter()
            .map(|line| {
                StockMovement::new(
                    Uuid::new_v4().to_string(),
                    line.product_id.clone(),
                    -line.quantity,
                    MovementType::SaleOnline,
                    Some(reason.clone()),
                    now,
                )
            })
            .collect();

        self.db.orders().create_order(&order, &movements).await?;

        // The order and its ledger entries are durable; now the cart may go.
        session.clear();

        info!(
            order_id = %order.id,
            total = order.total_cents,
            items = order.items.len(),
            "Online order placed"
        );

        Ok(order)
    }
}

/// Last six characters of an id, for human-facing references.
pub(crate) fn short_id(id: &str) -> &str {
    let len = id.len();
    &id[len.saturating_sub(6)..]
}
