//! # Fulfillment Service
//!
//! Orchestrates the order fulfillment pipeline: dispatcher assignment,
//! picking (with missing-item shortfalls), rider assignment, delivery,
//! cancellation and returns.
//!
//! Every operation follows the same shape:
//!
//! 1. load the order (not found is its own error — retrying won't help)
//! 2. ask the pure transition table what the event does from this state
//! 3. apply the transition plus its ledger side effects in one store
//!    transaction, guarded on the state the decision was computed from
//!
//! A rejected event or a failed write leaves the order exactly as it was.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use mercado_core::{
    apply_event, pricing, CartLine, CoreError, FulfillmentEvent, MovementType, Order,
    ReturnRecord, StockMovement,
};
use mercado_store::Database;

use crate::checkout::short_id;
use crate::error::{EngineError, EngineResult};

/// Service for back-office fulfillment operations.
#[derive(Debug, Clone)]
pub struct FulfillmentService {
    db: Database,
}

impl FulfillmentService {
    /// Creates a new FulfillmentService.
    pub fn new(db: Database) -> Self {
        FulfillmentService { db }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Loads an order or reports it missing.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))
    }

    /// Picked orders waiting for a rider.
    pub async fn pickup_queue(&self) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().pickup_queue().await?)
    }

    /// Orders currently out with a rider.
    pub async fn rider_orders(&self, repartidor_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().rider_orders(repartidor_id).await?)
    }

    /// Orders a dispatcher is currently picking.
    pub async fn dispatcher_orders(&self, despachador_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().dispatcher_orders(despachador_id).await?)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Assigns the order to a dispatcher for picking.
    /// Only valid while the order is untouched (`No preparado`).
    pub async fn assign_to_dispatcher(
        &self,
        order_id: &str,
        despachador_id: &str,
    ) -> EngineResult<Order> {
        let order = self.get_order(order_id).await?;
        let transition = apply_event(
            order.status,
            order.fulfillment_status,
            FulfillmentEvent::AssignDispatcher,
        )?;

        self.db
            .orders()
            .apply_transition(
                order_id,
                order.status,
                order.fulfillment_status,
                &transition,
                Some(despachador_id),
                None,
                &[],
                Utc::now(),
            )
            .await?;

        info!(order_id, despachador_id, "Order assigned to dispatcher");
        self.get_order(order_id).await
    }

    /// Completes picking. `missing_product_ids` lists the items the
    /// dispatcher could not find on the shelves.
    ///
    /// All found → `Listo para despacho`; any missing → `Listo con
    /// faltantes`. Either way the customer sees `Listo para recoger`. Each
    /// missing item is recorded as a negative adjustment referencing the
    /// order, in the same transaction as the status flip.
    pub async fn complete_picking(
        &self,
        order_id: &str,
        missing_product_ids: &[String],
    ) -> EngineResult<Order> {
        let order = self.get_order(order_id).await?;

        for product_id in missing_product_ids {
            if !order.items.iter().any(|l| &l.product_id == product_id) {
                return Err(CoreError::ProductNotInOrder(product_id.clone()).into());
            }
        }

        let transition = apply_event(
            order.status,
            order.fulfillment_status,
            FulfillmentEvent::CompletePicking {
                any_missing: !missing_product_ids.is_empty(),
            },
        )?;

        let now = Utc::now();
        let reason = format!("Faltante en Picking Pedido #{}", short_id(order_id));
        let movements: Vec<StockMovement> = order
            .items
            .iter()
            .filter(|line| missing_product_ids.contains(&line.product_id))
            .map(|line| {
                StockMovement::new(
                    Uuid::new_v4().to_string(),
                    line.product_id.clone(),
                    -line.quantity,
                    MovementType::Adjustment,
                    Some(reason.clone()),
                    now,
                )
            })
            .collect();

        self.db
            .orders()
            .apply_transition(
                order_id,
                order.status,
                order.fulfillment_status,
                &transition,
                None,
                None,
                &movements,
                now,
            )
            .await?;

        info!(
            order_id,
            missing = missing_product_ids.len(),
            "Picking completed"
        );
        self.get_order(order_id).await
    }

    /// Hands the order to a rider. Rejected unless the order is picked
    /// (`Listo para despacho` or `Listo con faltantes`); records the pickup
    /// timestamp.
    pub async fn assign_to_rider(
        &self,
        order_id: &str,
        repartidor_id: &str,
    ) -> EngineResult<Order> {
        let order = self.get_order(order_id).await?;
        let transition = apply_event(
            order.status,
            order.fulfillment_status,
            FulfillmentEvent::AssignRider,
        )?;

        self.db
            .orders()
            .apply_transition(
                order_id,
                order.status,
                order.fulfillment_status,
                &transition,
                None,
                Some(repartidor_id),
                &[],
                Utc::now(),
            )
            .await?;

        info!(order_id, repartidor_id, "Order out for delivery");
        self.get_order(order_id).await
    }

    /// Marks the order delivered. Terminal on both axes; records the
    /// delivery timestamp.
    pub async fn mark_delivered(&self, order_id: &str) -> EngineResult<Order> {
        let order = self.get_order(order_id).await?;
        let transition = apply_event(
            order.status,
            order.fulfillment_status,
            FulfillmentEvent::MarkDelivered,
        )?;

        self.db
            .orders()
            .apply_transition(
                order_id,
                order.status,
                order.fulfillment_status,
                &transition,
                None,
                None,
                &[],
                Utc::now(),
            )
            .await?;

        info!(order_id, "Order delivered");
        self.get_order(order_id).await
    }

    /// Cancels the order. Rejected from terminal states.
    pub async fn cancel_order(&self, order_id: &str) -> EngineResult<Order> {
        let order = self.get_order(order_id).await?;
        let transition = apply_event(
            order.status,
            order.fulfillment_status,
            FulfillmentEvent::Cancel,
        )?;

        self.db
            .orders()
            .apply_transition(
                order_id,
                order.status,
                order.fulfillment_status,
                &transition,
                None,
                None,
                &[],
                Utc::now(),
            )
            .await?;

        info!(order_id, "Order cancelled");
        self.get_order(order_id).await
    }

    // -------------------------------------------------------------------------
    // Returns
    // -------------------------------------------------------------------------

    /// Processes a return against an order.
    ///
    /// `returned` pairs product ids with returned quantities, each capped by
    /// the originally purchased quantity. The refund is pro-rated from the
    /// original bundle-priced line totals. Depending on `restocked`, each
    /// item emits a positive `return` movement or a negative `adjustment`
    /// movement. Order flip, return record and ledger entries commit
    /// together.
    pub async fn process_return(
        &self,
        order_id: &str,
        returned: &[(String, i64)],
        reason: &str,
        restocked: bool,
    ) -> EngineResult<ReturnRecord> {
        let order = self.get_order(order_id).await?;

        // Validates the event is legal from the current status; the actual
        // flip is guarded in the store on the same status.
        apply_event(
            order.status,
            order.fulfillment_status,
            FulfillmentEvent::ProcessReturn,
        )?;

        let now = Utc::now();
        let mut returned_lines: Vec<CartLine> = Vec::new();
        let mut refund = mercado_core::Money::zero();

        for (product_id, quantity) in returned {
            let original = order
                .items
                .iter()
                .find(|l| &l.product_id == product_id)
                .ok_or_else(|| CoreError::ProductNotInOrder(product_id.clone()))?;

            if *quantity <= 0 {
                continue;
            }
            if *quantity > original.quantity {
                return Err(CoreError::ReturnExceedsPurchase {
                    product_id: product_id.clone(),
                    requested: *quantity,
                    purchased: original.quantity,
                }
                .into());
            }

            refund += pricing::refund_for_quantity(original, *quantity);

            let mut line = original.clone();
            line.quantity = *quantity;
            returned_lines.push(line);
        }

        if returned_lines.is_empty() {
            return Err(CoreError::Validation(
                mercado_core::ValidationError::Required {
                    field: "returned items".to_string(),
                },
            )
            .into());
        }

        let movements: Vec<StockMovement> = returned_lines
            .iter()
            .map(|line| {
                if restocked {
                    StockMovement::new(
                        Uuid::new_v4().to_string(),
                        line.product_id.clone(),
                        line.quantity,
                        MovementType::Return,
                        Some(format!("Devolución Pedido #{}", short_id(order_id))),
                        now,
                    )
                } else {
                    StockMovement::new(
                        Uuid::new_v4().to_string(),
                        line.product_id.clone(),
                        -line.quantity,
                        MovementType::Adjustment,
                        Some(format!("Dañado en Devolución #{}", short_id(order_id))),
                        now,
                    )
                }
            })
            .collect();

        let record = ReturnRecord {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            items: returned_lines,
            reason: reason.to_string(),
            restocked,
            refund_cents: refund.cents(),
            channel: order.channel,
            created_at: now,
        };

        self.db
            .orders()
            .apply_return(order.status, &record, &movements)
            .await?;

        info!(
            order_id,
            refund = record.refund_cents,
            restocked,
            "Return processed"
        );

        Ok(record)
    }
}
