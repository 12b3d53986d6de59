//! # Reporting Service
//!
//! Back-office financial views: the profit summary (revenue, cost of goods
//! from the cost snapshots frozen into order lines, expenses) and the
//! spoilage report (negative adjustments priced at product cost).
//!
//! Reads whole ledgers and delegates the arithmetic to the pure pricing
//! module, so the numbers are unit-testable without a database.

use mercado_core::pricing;
use mercado_core::{FinancialSummary, SpoilageReport};
use mercado_store::Database;

use crate::error::EngineResult;

/// Service for financial reporting.
#[derive(Debug, Clone)]
pub struct ReportingService {
    db: Database,
}

impl ReportingService {
    /// Creates a new ReportingService.
    pub fn new(db: Database) -> Self {
        ReportingService { db }
    }

    /// Profit summary over all orders and expenses.
    pub async fn financial_summary(&self) -> EngineResult<FinancialSummary> {
        let orders = self.db.orders().list_all().await?;
        let expenses = self.db.financial().list_expenses().await?;

        Ok(pricing::financial_summary(&orders, &expenses))
    }

    /// Spoilage (merma) report: negative adjustment movements priced at the
    /// product's cost basis.
    pub async fn spoilage_report(&self) -> EngineResult<SpoilageReport> {
        let movements = self.db.ledger().negative_adjustments().await?;
        let products = self.db.products().list_all().await?;

        Ok(pricing::spoilage_report(&movements, &products))
    }
}
