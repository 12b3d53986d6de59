//! # Financial Records Repository
//!
//! Append-only expense and return records. Queryable in full — at this
//! scale the financial center reads whole ledgers, no pagination.
//!
//! Returns are *written* by the order repository (the record must commit in
//! the same transaction as the order's `Devuelto` flip and the restock
//! movements); this repository reads them back.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use mercado_core::{CartLine, Channel, Expense, ExpenseCategory, ReturnRecord};

#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: String,
    amount_cents: i64,
    category: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = StoreError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let category: ExpenseCategory =
            row.category.parse().map_err(StoreError::CorruptPayload)?;

        Ok(Expense {
            id: row.id,
            amount_cents: row.amount_cents,
            category,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    id: String,
    order_id: String,
    items: String,
    reason: String,
    restocked: bool,
    refund_cents: i64,
    channel: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for ReturnRecord {
    type Error = StoreError;

    fn try_from(row: ReturnRow) -> Result<Self, Self::Error> {
        let items: Vec<CartLine> = serde_json::from_str(&row.items)?;
        let channel: Channel = row.channel.parse().map_err(StoreError::CorruptPayload)?;

        Ok(ReturnRecord {
            id: row.id,
            order_id: row.order_id,
            items,
            reason: row.reason,
            restocked: row.restocked,
            refund_cents: row.refund_cents,
            channel,
            created_at: row.created_at,
        })
    }
}

/// Repository for financial record operations.
#[derive(Debug, Clone)]
pub struct FinancialRepository {
    pool: SqlitePool,
}

impl FinancialRepository {
    /// Creates a new FinancialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FinancialRepository { pool }
    }

    /// Appends an expense. The id and timestamp are assigned here.
    pub async fn add_expense(
        &self,
        amount_cents: i64,
        category: ExpenseCategory,
        description: &str,
    ) -> StoreResult<Expense> {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            amount_cents,
            category,
            description: description.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %expense.id, amount = amount_cents, "Adding expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (id, amount_cents, category, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&expense.id)
        .bind(expense.amount_cents)
        .bind(expense.category.as_str())
        .bind(&expense.description)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// All expenses, newest first.
    pub async fn list_expenses(&self) -> StoreResult<Vec<Expense>> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(
            r#"
            SELECT id, amount_cents, category, description, created_at
            FROM expenses ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Expense::try_from).collect()
    }

    /// All returns, newest first.
    pub async fn list_returns(&self) -> StoreResult<Vec<ReturnRecord>> {
        let rows: Vec<ReturnRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, items, reason, restocked, refund_cents, channel, created_at
            FROM returns ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReturnRecord::try_from).collect()
    }

    /// Returns recorded against one order.
    pub async fn returns_for_order(&self, order_id: &str) -> StoreResult<Vec<ReturnRecord>> {
        let rows: Vec<ReturnRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, items, reason, restocked, refund_cents, channel, created_at
            FROM returns WHERE order_id = ?1 ORDER BY created_at DESC, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReturnRecord::try_from).collect()
    }
}
