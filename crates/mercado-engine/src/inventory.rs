//! # Inventory Service
//!
//! Operator-facing stock operations: receiving merchandise, recording
//! adjustments (counts, damage, spoilage), and reading movement history.
//!
//! The ledger is the source of truth; every write lands as an append-only
//! movement plus the cached `products.stock` bump in the same transaction.
//! `reconcile` exposes the (cached, derived) pair so a mismatch — which
//! would indicate a write path bypassing the ledger — is observable.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use mercado_core::{validation, MovementType, StockMovement};
use mercado_store::Database;

use crate::error::{EngineError, EngineResult};

/// Service for inventory operations.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    /// Creates a new InventoryService.
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    /// Records received merchandise (always a positive movement).
    pub async fn receive_stock(
        &self,
        product_id: &str,
        quantity: i64,
        reason: Option<&str>,
    ) -> EngineResult<StockMovement> {
        validation::validate_id("product_id", product_id).map_err(mercado_core::CoreError::from)?;
        validation::validate_quantity(quantity).map_err(mercado_core::CoreError::from)?;
        if let Some(reason) = reason {
            validation::validate_reason(reason).map_err(mercado_core::CoreError::from)?;
        }

        let movement = StockMovement::new(
            Uuid::new_v4().to_string(),
            product_id,
            quantity,
            MovementType::Reception,
            reason.map(str::to_string),
            Utc::now(),
        );

        self.record(&movement).await?;
        info!(product_id, quantity, "Stock received");
        Ok(movement)
    }

    /// Records a signed adjustment. Negative quantities capture shrinkage
    /// and spoilage; positive quantities correct undercounts. A reason is
    /// required — adjustments are audited.
    pub async fn make_adjustment(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
    ) -> EngineResult<StockMovement> {
        validation::validate_id("product_id", product_id).map_err(mercado_core::CoreError::from)?;
        validation::validate_movement_quantity(quantity)
            .map_err(mercado_core::CoreError::from)?;
        if reason.trim().is_empty() {
            return Err(mercado_core::CoreError::Validation(
                mercado_core::ValidationError::Required {
                    field: "reason".to_string(),
                },
            )
            .into());
        }
        validation::validate_reason(reason).map_err(mercado_core::CoreError::from)?;

        let movement = StockMovement::new(
            Uuid::new_v4().to_string(),
            product_id,
            quantity,
            MovementType::Adjustment,
            Some(reason.to_string()),
            Utc::now(),
        );

        self.record(&movement).await?;
        info!(product_id, quantity, reason, "Stock adjusted");
        Ok(movement)
    }

    /// Movement history for one product, oldest first.
    pub async fn movements_for_product(
        &self,
        product_id: &str,
    ) -> EngineResult<Vec<StockMovement>> {
        Ok(self.db.ledger().movements_for_product(product_id).await?)
    }

    /// Current stock derived from the ledger.
    pub async fn current_stock(&self, product_id: &str) -> EngineResult<i64> {
        Ok(self.db.ledger().current_stock(product_id).await?)
    }

    /// Returns `(cached, derived)` stock for verification.
    pub async fn reconcile(&self, product_id: &str) -> EngineResult<(i64, i64)> {
        Ok(self.db.ledger().reconcile(product_id).await?)
    }

    async fn record(&self, movement: &StockMovement) -> EngineResult<()> {
        self.db
            .ledger()
            .record_movement(movement)
            .await
            .map_err(|err| match err {
                mercado_store::StoreError::NotFound { .. } => {
                    EngineError::ProductNotFound(movement.product_id.clone())
                }
                other => other.into(),
            })
    }
}
