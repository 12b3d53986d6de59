//! # Store Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! SQLite Error (sqlx::Error)
//!      │
//!      ▼
//! StoreError (this module) ← adds context and categorization
//!      │
//!      ▼
//! EngineError / SyncError ← what services and the sync agent see
//! ```
//!
//! "Not found" is kept distinct from connection/query failures: retrying a
//! missing order will not help, retrying a dropped connection might.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation (e.g. a movement referencing a
    /// product that does not exist).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A guarded update matched no row: the entity changed state under us.
    /// The transition was not applied; the caller may re-read and retry.
    #[error("{entity} {id} was modified concurrently, transition not applied")]
    Conflict { entity: String, id: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored JSON column failed to (de)serialize.
    #[error("Corrupt stored payload: {0}")]
    CorruptPayload(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a guarded update that matched no row.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to StoreError.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StoreError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    StoreError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    StoreError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::CorruptPayload(err.to_string())
    }
}

/// Result type for database operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("Order", "order-42");
        assert_eq!(err.to_string(), "Order not found: order-42");
    }

    #[test]
    fn test_conflict_message() {
        let err = StoreError::conflict("Order", "order-42");
        assert!(err.to_string().contains("modified concurrently"));
    }
}
