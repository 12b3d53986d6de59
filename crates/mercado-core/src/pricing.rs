//! # Pricing Engine
//!
//! Pure pricing functions: line totals under tiered bundle offers and
//! percentage discounts, cart-level totals per sales channel, promo code
//! resolution, POS manual discounts, return refund pro-ration, and the
//! financial aggregation helpers used by back-office reporting.
//!
//! ## Bundle Pricing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Coca-Cola 2L, unit Bs 10, tiers [{6 → Bs 55}, {12 → Bs 100}]          │
//! │                                                                         │
//! │  Quantity 14:                                                           │
//! │    tier 12 → 1 block  = Bs 100   (remaining 2)                          │
//! │    tier  6 → 0 blocks            (remaining 2)                          │
//! │    remainder 2 × Bs 10 = Bs 20                                          │
//! │    line total          = Bs 120                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tiers are filled greedily, largest first, and the remainder is priced at
//! the effective single-unit rate — never at a smaller tier's rate. This is
//! the compatibility policy the storefront has always used, not a bin-packing
//! optimum. Bundle prices are absolute: the percentage discount applies only
//! to non-bundled remainder units.
//!
//! Pricing never fails. Every function here totals to a number; totals clamp
//! at zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    CartLine, Channel, Discount, Expense, MovementType, Order, Product, StockMovement,
};
use crate::{DELIVERY_FEE_CENTS, PROMO10_BPS, PROMO10_CODE, SERVICE_FEE_BPS};

// =============================================================================
// Line Totals
// =============================================================================

/// Computes the payable total for one cart line.
///
/// 1. Effective single-unit price = unit price minus the percentage
///    discount, when one is present.
/// 2. No bundle tiers → quantity × effective single-unit price.
/// 3. With tiers: sort descending by tier quantity, fill whole blocks
///    largest-first, then price the remainder at the effective single-unit
///    price.
pub fn line_total(line: &CartLine) -> Money {
    let single_price = effective_single_price(line);

    if line.bundle_offers.is_empty() {
        return single_price * line.quantity;
    }

    let mut tiers = line.bundle_offers.clone();
    // Largest tier first; equal tiers collapse to the same block size so the
    // ordering between them cannot change the result.
    tiers.sort_by(|a, b| b.quantity.cmp(&a.quantity));

    let mut remaining = line.quantity;
    let mut total = Money::zero();

    for tier in &tiers {
        if tier.quantity > 0 && remaining >= tier.quantity {
            let blocks = remaining / tier.quantity;
            total += tier.price() * blocks;
            remaining %= tier.quantity;
        }
    }

    total + single_price * remaining
}

/// The per-unit price after the line's percentage discount, if any.
fn effective_single_price(line: &CartLine) -> Money {
    match line.discount_bps {
        Some(bps) => line.unit_price().apply_percentage_discount(bps),
        None => line.unit_price(),
    }
}

/// Sums line totals across the cart.
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(line_total).sum()
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Aggregated cart totals, recomputed on every mutation — never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub service_fee_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Computes cart-level totals for the given channel.
///
/// Online carts pay a flat delivery fee (only when non-empty) and a
/// percentage service fee; in-store sales pay neither. The grand total is
/// `subtotal + fees − discount`, clamped at zero.
pub fn cart_totals(lines: &[CartLine], channel: Channel, discount: Option<&Discount>) -> CartTotals {
    let subtotal = subtotal(lines);

    let (delivery_fee, service_fee) = match channel {
        Channel::Online if !lines.is_empty() => (
            Money::from_cents(DELIVERY_FEE_CENTS),
            subtotal.portion_bps(SERVICE_FEE_BPS),
        ),
        Channel::Online => (Money::zero(), Money::zero()),
        Channel::Pos => (Money::zero(), Money::zero()),
    };

    let discount_amount = discount.map(Discount::amount).unwrap_or_else(Money::zero);
    let total = (subtotal + delivery_fee + service_fee - discount_amount).clamp_at_zero();

    CartTotals {
        subtotal_cents: subtotal.cents(),
        delivery_fee_cents: delivery_fee.cents(),
        service_fee_cents: service_fee.cents(),
        discount_cents: discount_amount.cents(),
        total_cents: total.cents(),
    }
}

// =============================================================================
// Promo Codes
// =============================================================================

/// Resolves a promo code against the current subtotal.
///
/// Codes map deterministically to a discount policy; an unrecognized code is
/// a typed rejection so the caller can tell the shopper, never a silent
/// no-op. Matching is case-insensitive.
pub fn resolve_promo_code(code: &str, subtotal: Money) -> CoreResult<Discount> {
    let normalized = code.trim().to_uppercase();

    if normalized == PROMO10_CODE {
        return Ok(Discount {
            code: PROMO10_CODE.to_string(),
            amount_cents: subtotal.portion_bps(PROMO10_BPS).cents(),
        });
    }

    Err(CoreError::UnknownPromoCode(code.to_string()))
}

// =============================================================================
// POS Manual Discounts
// =============================================================================

/// A discount entered by the POS operator at the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum PosDiscount {
    /// Percentage of the sale subtotal (whole percent, e.g. 15).
    Percentage(u32),
    /// Fixed amount in cents, capped at the subtotal.
    Fixed(i64),
}

/// Materializes a POS operator discount into a `Discount` with a computed
/// amount and a receipt label.
///
/// Returns `None` when the discount works out to zero, matching the
/// register UI which only shows a discount row for a non-zero amount.
pub fn pos_discount(subtotal: Money, discount: PosDiscount) -> Option<Discount> {
    let (code, amount) = match discount {
        PosDiscount::Percentage(percent) => (
            format!("Descuento {percent}%"),
            subtotal.portion_bps(percent * 100),
        ),
        PosDiscount::Fixed(cents) => (
            "Monto Fijo".to_string(),
            Money::from_cents(cents.min(subtotal.cents())),
        ),
    };

    if amount.is_positive() {
        Some(Discount {
            code,
            amount_cents: amount.cents(),
        })
    } else {
        None
    }
}

// =============================================================================
// Return Refunds
// =============================================================================

/// Refund for returning `returned_qty` units of an original order line.
///
/// Pro-rated from the original line total — which includes bundle pricing
/// and the captured percentage discount — never recomputed from the current
/// catalog price.
pub fn refund_for_quantity(original_line: &CartLine, returned_qty: i64) -> Money {
    line_total(original_line).pro_rate(returned_qty, original_line.quantity)
}

// =============================================================================
// Financial Aggregation
// =============================================================================

/// Profit summary over a set of orders and expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_revenue_cents: i64,
    pub total_cost_of_goods_cents: i64,
    pub gross_profit_cents: i64,
    pub total_expenses_cents: i64,
    pub net_profit_cents: i64,
}

/// Aggregates revenue, cost of goods (from the cost snapshots frozen into
/// order lines), gross profit, expenses and net profit.
pub fn financial_summary(orders: &[Order], expenses: &[Expense]) -> FinancialSummary {
    let revenue: Money = orders.iter().map(Order::total).sum();

    let cost_of_goods: Money = orders
        .iter()
        .flat_map(|order| order.items.iter())
        .map(|line| line.cost() * line.quantity)
        .sum();

    let total_expenses: Money = expenses
        .iter()
        .map(|expense| Money::from_cents(expense.amount_cents))
        .sum();

    let gross_profit = revenue - cost_of_goods;
    let net_profit = gross_profit - total_expenses;

    FinancialSummary {
        total_revenue_cents: revenue.cents(),
        total_cost_of_goods_cents: cost_of_goods.cents(),
        gross_profit_cents: gross_profit.cents(),
        total_expenses_cents: total_expenses.cents(),
        net_profit_cents: net_profit.cents(),
    }
}

/// One spoilage row: a negative adjustment movement priced at product cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SpoilageDetail {
    pub movement: StockMovement,
    pub product_name: String,
    pub cost_cents: i64,
}

/// Spoilage (merma) report derived from the inventory ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SpoilageReport {
    pub total_cost_cents: i64,
    pub details: Vec<SpoilageDetail>,
}

/// Builds the spoilage report: negative `adjustment` movements costed at the
/// product's cost basis. Movements whose product is no longer in the catalog
/// are skipped.
pub fn spoilage_report(movements: &[StockMovement], products: &[Product]) -> SpoilageReport {
    let mut total = Money::zero();
    let mut details = Vec::new();

    for movement in movements {
        if movement.movement_type != MovementType::Adjustment || movement.quantity >= 0 {
            continue;
        }

        if let Some(product) = products.iter().find(|p| p.id == movement.product_id) {
            let cost = product.cost_or_default() * movement.quantity.abs();
            total += cost;
            details.push(SpoilageDetail {
                movement: movement.clone(),
                product_name: product.name.clone(),
                cost_cents: cost.cents(),
            });
        }
    }

    SpoilageReport {
        total_cost_cents: total.cents(),
        details,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
