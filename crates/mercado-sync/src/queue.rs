//! # Offline Sale Queue
//!
//! Accepts finalized POS sales with zero network dependency and reconciles
//! them with the central order store opportunistically.
//!
//! ## Sync Round
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  drain_and_sync()                                                       │
//! │                                                                         │
//! │  1. snapshot()            → the batch: [(key, sale), ...]              │
//! │     (empty? → Synced, done)                                            │
//! │                                                                         │
//! │  2. create_orders_batch(sales)                                          │
//! │        │                                                                │
//! │        ├── Err → queue UNTOUCHED, report Offline.                       │
//! │        │         Fully retryable: nothing was removed, and the store    │
//! │        │         assigns fresh ids per submission, so the retry can     │
//! │        │         never double-count.                                    │
//! │        │                                                                │
//! │        └── Ok (acknowledged durable)                                    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  3. remove(exactly the snapshotted keys)                                │
//! │     Sales enqueued during the network round-trip keep their rows and    │
//! │     go out with the next round.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Serialization of rounds is the agent's job (a single task owns the
//! drain loop); this type holds no interior state beyond its two ports.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use mercado_core::{PosSale, QueuedSale};

use crate::error::SyncResult;
use crate::ports::{OrderSink, QueueStore};

// =============================================================================
// Sync Status
// =============================================================================

/// Connectivity status reported to the POS UI after each sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Syncing,
    Offline,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Sale Queue
// =============================================================================

/// The offline-first sale queue.
#[derive(Clone)]
pub struct SaleQueue {
    store: Arc<dyn QueueStore>,
    sink: Arc<dyn OrderSink>,
}

impl SaleQueue {
    /// Creates a queue over a local store and an order sink.
    pub fn new(store: Arc<dyn QueueStore>, sink: Arc<dyn OrderSink>) -> Self {
        SaleQueue { store, sink }
    }

    /// Appends a finalized sale to local durable storage.
    ///
    /// No network involved: this succeeds while fully offline, and the POS
    /// keeps accepting sales indefinitely.
    pub async fn enqueue(&self, sale: PosSale) -> SyncResult<i64> {
        let key = self.store.append(&sale).await?;
        debug!(key, total = sale.total_cents, "Sale enqueued");
        Ok(key)
    }

    /// Read-only listing of queued, not-yet-synced sales — the end-of-shift
    /// report reads this before a manual clear.
    pub async fn queue_snapshot(&self) -> SyncResult<Vec<QueuedSale>> {
        self.store.snapshot().await
    }

    /// Number of sales waiting to sync.
    pub async fn pending_count(&self) -> SyncResult<i64> {
        self.store.pending_count().await
    }

    /// Attempts one sync round against the central order store.
    ///
    /// Returns the resulting status. `Err` is reserved for local storage
    /// failures; an unreachable sink is `Ok(Offline)` — routine, not
    /// exceptional.
    pub async fn drain_and_sync(&self) -> SyncResult<SyncStatus> {
        let queued = self.store.snapshot().await?;

        if queued.is_empty() {
            debug!("No sales in queue to sync");
            return Ok(SyncStatus::Synced);
        }

        info!(count = queued.len(), "Syncing queued sales");

        let keys: Vec<i64> = queued.iter().map(|q| q.key).collect();
        let sales: Vec<PosSale> = queued
            .into_iter()
            .map(|q| normalize_fees(q.sale))
            .collect();

        match self.sink.create_orders_batch(&sales).await {
            Ok(created) => {
                // Acknowledged durable: clear exactly what was submitted.
                self.store.remove(&keys).await?;
                info!(created, "Sales queue synced and cleared");
                Ok(SyncStatus::Synced)
            }
            Err(err) => {
                warn!(error = %err, pending = keys.len(), "Sync failed, queue left intact");
                Ok(SyncStatus::Offline)
            }
        }
    }

    /// Operator-triggered purge, used only after the end-of-shift report
    /// has been reviewed. Deliberately separate from automatic sync.
    pub async fn clear_after_manual_reconciliation(&self) -> SyncResult<()> {
        self.store.clear().await?;
        info!("Sales queue cleared after manual reconciliation");
        Ok(())
    }
}

/// Register sales never carry delivery or service fees; enforce that on the
/// wire regardless of what was queued.
fn normalize_fees(mut sale: PosSale) -> PosSale {
    sale.delivery_fee_cents = 0;
    sale.service_fee_cents = 0;
    sale
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mercado_core::{Money, PaymentMethod};

    #[test]
    fn test_normalize_fees() {
        let mut sale = PosSale::new(
            vec![],
            Money::from_cents(1000),
            Money::from_cents(1000),
            None,
            PaymentMethod::Cash,
            Utc::now(),
        );
        sale.delivery_fee_cents = 1000;
        sale.service_fee_cents = 20;

        let normalized = normalize_fees(sale);
        assert_eq!(normalized.delivery_fee_cents, 0);
        assert_eq!(normalized.service_fee_cents, 0);
        assert_eq!(normalized.total_cents, 1000);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SyncStatus::Synced.to_string(), "synced");
        assert_eq!(SyncStatus::Syncing.to_string(), "syncing");
        assert_eq!(SyncStatus::Offline.to_string(), "offline");
    }
}
