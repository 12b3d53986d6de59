//! # Database Migrations
//!
//! Embedded SQL migrations for the Mercado store.
//!
//! Migration files live in `migrations/sqlite/` at the workspace root and
//! are embedded into the binary at compile time. Adding a migration:
//!
//! 1. Create `NNN_description.sql` with the next sequence number
//! 2. Write idempotent SQL (`IF NOT EXISTS` where possible)
//! 3. Never modify an existing migration — always add a new one

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent and ordered: sqlx tracks applied migrations in
/// `_sqlx_migrations` and runs each pending file in a transaction.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
