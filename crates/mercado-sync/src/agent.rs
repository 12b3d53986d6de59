//! # Sync Agent
//!
//! The background task that owns the sync schedule: once at startup, on a
//! fixed interval, and on explicit operator request (shift close).
//!
//! ## Single In-Flight Sync
//! One spawned task owns the drain loop, so sync rounds are serialized by
//! construction — concurrent triggers cannot interleave against the same
//! queue contents. The trigger channel has capacity 1: a request arriving
//! while a round is already pending is superseded, not queued up behind it.
//!
//! ## Cancel/Replace Contract
//! `SyncAgent::spawn` returns a handle; `shutdown()` consumes the handle,
//! stops the timer and waits for the task to finish. Re-initialization means
//! shutting the old agent down and spawning a new one — duplicate timers
//! cannot accumulate across re-inits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::queue::{SaleQueue, SyncStatus};

// =============================================================================
// Configuration
// =============================================================================

/// How often the agent retries the queue on its own.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Sync agent configuration.
#[derive(Debug, Clone)]
pub struct SyncAgentConfig {
    /// Periodic sync interval.
    pub interval: Duration,

    /// Whether to attempt a sync immediately on startup.
    pub sync_on_start: bool,
}

impl Default for SyncAgentConfig {
    fn default() -> Self {
        SyncAgentConfig {
            interval: DEFAULT_SYNC_INTERVAL,
            sync_on_start: true,
        }
    }
}

// =============================================================================
// Status Listener
// =============================================================================

/// Receives status updates for the POS UI (implemented by the presentation
/// integration). Failures only ever downgrade this signal; they never abort
/// the operator session.
pub trait SyncStatusListener: Send + Sync {
    fn status_changed(&self, status: SyncStatus);
}

/// No-op listener for headless use and tests.
pub struct NoOpListener;

impl SyncStatusListener for NoOpListener {
    fn status_changed(&self, _status: SyncStatus) {}
}

// =============================================================================
// Agent
// =============================================================================

/// Handle for controlling a running sync agent.
pub struct SyncAgentHandle {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncAgentHandle {
    /// Requests a sync round (shift close, connectivity restored, ...).
    ///
    /// Fire-and-forget: if a round is already pending the request is
    /// superseded by it rather than queued behind it.
    pub fn request_sync(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Stops the agent: cancels the periodic timer and waits for the task
    /// to finish. After this returns a replacement agent may be spawned.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(err) = self.task.await {
            error!(?err, "Sync agent task panicked during shutdown");
        }
        info!("Sync agent stopped");
    }
}

/// The background sync agent.
pub struct SyncAgent;

impl SyncAgent {
    /// Spawns the agent task and returns its handle.
    pub fn spawn(
        queue: Arc<SaleQueue>,
        config: SyncAgentConfig,
        listener: Arc<dyn SyncStatusListener>,
    ) -> SyncAgentHandle {
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            info!(interval_secs = config.interval.as_secs(), "Sync agent starting");

            if config.sync_on_start {
                Self::sync_once(&queue, listener.as_ref()).await;
            }

            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of a fresh interval completes immediately;
            // consume it so the startup sync isn't doubled.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        debug!("Periodic sync tick");
                        Self::sync_once(&queue, listener.as_ref()).await;
                    }

                    Some(()) = trigger_rx.recv() => {
                        debug!("Sync requested");
                        Self::sync_once(&queue, listener.as_ref()).await;
                    }

                    _ = shutdown_rx.recv() => {
                        info!("Sync agent shutting down");
                        break;
                    }
                }
            }
        });

        SyncAgentHandle {
            trigger_tx,
            shutdown_tx,
            task,
        }
    }

    /// One serialized sync round with status reporting around it.
    async fn sync_once(queue: &SaleQueue, listener: &dyn SyncStatusListener) {
        listener.status_changed(SyncStatus::Syncing);

        let status = match queue.drain_and_sync().await {
            Ok(status) => status,
            Err(err) => {
                // Local storage trouble. The sale data is still on disk;
                // keep the POS alive and show offline.
                error!(error = %err, "Sync round failed against local storage");
                SyncStatus::Offline
            }
        };

        listener.status_changed(status);
    }
}
