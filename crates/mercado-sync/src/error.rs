//! # Sync Error Types
//!
//! For the sale queue, a failed submit is *expected and routine* — it means
//! the register is offline. Those failures downgrade the sync status rather
//! than surfacing as errors; only local durable-storage problems propagate
//! as `Err` to the caller.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The central order store could not be reached or rejected the batch.
    /// Routine while offline; the queue is left untouched and the next
    /// attempt retries the same sales.
    #[error("Order store unavailable: {0}")]
    SinkUnavailable(String),

    /// The local durable store failed. Not a connectivity matter — the
    /// register's own storage is misbehaving.
    #[error("Local storage error: {0}")]
    Storage(String),

    /// A queued payload failed to (de)serialize.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The agent's control channel is gone (agent shut down).
    #[error("Sync agent channel closed: {0}")]
    ChannelClosed(String),
}

impl SyncError {
    /// True when the failed operation can be retried as-is. Sink failures
    /// always can: sync never removes more from the queue than has been
    /// positively acknowledged, so a retry cannot duplicate orders.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::SinkUnavailable(_))
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<mercado_store::StoreError> for SyncError {
    fn from(err: mercado_store::StoreError) -> Self {
        SyncError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::SinkUnavailable("timeout".into()).is_retryable());
        assert!(!SyncError::Storage("disk full".into()).is_retryable());
        assert!(!SyncError::Serialization("bad json".into()).is_retryable());
    }
}
