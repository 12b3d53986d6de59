//! # Domain Types
//!
//! Core domain types for the Mercado platform.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  product_id     │       │
//! │  │  price_cents    │   │  items (snap)   │   │  signed qty     │       │
//! │  │  bundle_offers  │   │  status ×2      │   │  movement_type  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  CartLine embeds an immutable product snapshot plus quantity and the    │
//! │  cost captured at add time. Orders own their CartLines forever; later   │
//! │  catalog edits never reach back into historical records.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order/fulfillment statuses keep their original Spanish wire strings: they
//! are what the storefront, the dispatcher tablet and the stored data all
//! speak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;
use crate::{DEFAULT_COST_BPS, POS_CUSTOMER_ID};

// =============================================================================
// Bundle Offer
// =============================================================================

/// A tiered pricing rule: buying `quantity` units unlocks a fixed total
/// price for that block.
///
/// A product may carry multiple tiers (e.g. 6 for 55, 12 for 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BundleOffer {
    /// Units covered by this tier. Always positive.
    pub quantity: i64,

    /// Fixed total price for the block, in cents.
    pub price_cents: i64,
}

impl BundleOffer {
    /// Returns the block price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Catalog data is read-only input to the commerce core: products are
/// supplied by the catalog service and referenced by id everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name shown to shoppers and on receipts.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Category name (e.g. "Frutas y Verduras").
    pub category: String,

    /// Pack size / weight label ("1kg", "2L", "unidad").
    pub weight: Option<String>,

    /// Image URL for the storefront.
    pub image_url: Option<String>,

    /// Free-form tags used for subcategory filtering.
    pub tags: Vec<String>,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Cost basis in cents, when known.
    pub cost_cents: Option<i64>,

    /// Flat percentage discount in basis points (1500 = 15%).
    pub discount_bps: Option<u32>,

    /// Tiered bundle offers, possibly empty.
    pub bundle_offers: Vec<BundleOffer>,

    /// Cached stock level. Derived from the movement ledger; reconcilable
    /// at any time by replaying movements.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost basis, defaulting to 70% of the unit price when the
    /// catalog carries no explicit cost.
    pub fn cost_or_default(&self) -> Money {
        match self.cost_cents {
            Some(cents) => Money::from_cents(cents),
            None => self.price().portion_bps(DEFAULT_COST_BPS),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Optional subcategory labels ("Chocolates", "Galletas", ...).
    pub subcategories: Vec<String>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line item: an immutable product snapshot plus quantity and the cost
/// captured at the moment the item entered the cart.
///
/// ## Snapshot Pattern
/// Price, discount, bundle tiers and cost are copied from the product when
/// the line is created. Catalog changes after that moment never alter the
/// line — this is what makes historical orders and profit reporting honest.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product reference (for stock movements and re-lookup).
    pub product_id: String,

    /// Product name at capture time (frozen).
    pub name: String,

    /// Unit price in cents at capture time (frozen).
    pub unit_price_cents: i64,

    /// Percentage discount in basis points at capture time (frozen).
    pub discount_bps: Option<u32>,

    /// Bundle tiers at capture time (frozen).
    pub bundle_offers: Vec<BundleOffer>,

    /// Quantity in the cart. Always positive; a quantity driven to zero
    /// removes the line instead.
    pub quantity: i64,

    /// Cost basis in cents captured when the line was created.
    pub cost_cents: i64,

    /// When this line was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Captures a new line from a product with quantity 1.
    ///
    /// The cost snapshot is taken here and never overwritten afterwards:
    /// re-adding an already-present product bumps quantity, not cost.
    pub fn from_product(product: &Product, now: DateTime<Utc>) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            discount_bps: product.discount_bps,
            bundle_offers: product.bundle_offers.clone(),
            quantity: 1,
            cost_cents: product.cost_or_default().cents(),
            added_at: now,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the captured cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// An applied cart/order discount.
///
/// The *amount* is stored, not the percentage, so an order remains immutable
/// evidence of what was actually charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Code or label ("PROMO10", "Descuento 15%", "Monto Fijo").
    pub code: String,

    /// Discount amount in cents.
    pub amount_cents: i64,
}

impl Discount {
    /// Returns the discount amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sales Channel & Payment Method
// =============================================================================

/// Where a transaction originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Channel {
    Online,
    #[serde(rename = "POS")]
    Pos,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Online => "Online",
            Channel::Pos => "POS",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(Channel::Online),
            "POS" => Ok(Channel::Pos),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// How a POS sale was paid. Recorded as a label only; settlement happens
/// outside this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Qr,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Qr => "qr",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "qr" => Ok(PaymentMethod::Qr),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

// =============================================================================
// Order Status (customer-facing)
// =============================================================================

/// Customer-facing order status.
///
/// `Recibido → En preparación → Listo para recoger → En camino → Entregado`,
/// with `Cancelado` and `Devuelto` as alternate terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum OrderStatus {
    Recibido,
    #[serde(rename = "En preparación")]
    EnPreparacion,
    #[serde(rename = "Listo para recoger")]
    ListoParaRecoger,
    #[serde(rename = "En camino")]
    EnCamino,
    Entregado,
    Cancelado,
    Devuelto,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Recibido => "Recibido",
            OrderStatus::EnPreparacion => "En preparación",
            OrderStatus::ListoParaRecoger => "Listo para recoger",
            OrderStatus::EnCamino => "En camino",
            OrderStatus::Entregado => "Entregado",
            OrderStatus::Cancelado => "Cancelado",
            OrderStatus::Devuelto => "Devuelto",
        }
    }

    /// Terminal states accept no further customer-facing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Entregado | OrderStatus::Cancelado | OrderStatus::Devuelto
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Recibido" => Ok(OrderStatus::Recibido),
            "En preparación" => Ok(OrderStatus::EnPreparacion),
            "Listo para recoger" => Ok(OrderStatus::ListoParaRecoger),
            "En camino" => Ok(OrderStatus::EnCamino),
            "Entregado" => Ok(OrderStatus::Entregado),
            "Cancelado" => Ok(OrderStatus::Cancelado),
            "Devuelto" => Ok(OrderStatus::Devuelto),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

// =============================================================================
// Fulfillment Status (operational)
// =============================================================================

/// Operational fulfillment status, distinct from the customer-facing status.
///
/// `No preparado → En preparación → {Listo para despacho | Listo con
/// faltantes} → En ruta → Entregado`, with `Cancelado` as alternate terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FulfillmentStatus {
    #[serde(rename = "No preparado")]
    NoPreparado,
    #[serde(rename = "En preparación")]
    EnPreparacion,
    #[serde(rename = "Listo para despacho")]
    ListoParaDespacho,
    #[serde(rename = "Listo con faltantes")]
    ListoConFaltantes,
    #[serde(rename = "En ruta")]
    EnRuta,
    Entregado,
    Cancelado,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::NoPreparado => "No preparado",
            FulfillmentStatus::EnPreparacion => "En preparación",
            FulfillmentStatus::ListoParaDespacho => "Listo para despacho",
            FulfillmentStatus::ListoConFaltantes => "Listo con faltantes",
            FulfillmentStatus::EnRuta => "En ruta",
            FulfillmentStatus::Entregado => "Entregado",
            FulfillmentStatus::Cancelado => "Cancelado",
        }
    }

    /// A picked order (with or without missing items) may be handed to a
    /// rider; nothing else may.
    pub fn is_ready_for_dispatch(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::ListoParaDespacho | FulfillmentStatus::ListoConFaltantes
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Entregado | FulfillmentStatus::Cancelado
        )
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "No preparado" => Ok(FulfillmentStatus::NoPreparado),
            "En preparación" => Ok(FulfillmentStatus::EnPreparacion),
            "Listo para despacho" => Ok(FulfillmentStatus::ListoParaDespacho),
            "Listo con faltantes" => Ok(FulfillmentStatus::ListoConFaltantes),
            "En ruta" => Ok(FulfillmentStatus::EnRuta),
            "Entregado" => Ok(FulfillmentStatus::Entregado),
            "Cancelado" => Ok(FulfillmentStatus::Cancelado),
            other => Err(format!("unknown fulfillment status: {other}")),
        }
    }
}

// =============================================================================
// Address
// =============================================================================

/// A delivery address, keyed by owning user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub street: String,
    pub city: String,
    /// Landmark / delivery reference, also used as delivery notes.
    pub reference: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order: line items frozen at purchase time plus totals and the
/// two status axes.
///
/// Orders are never deleted, only status-transitioned. The invariant
/// `total = subtotal + delivery_fee + service_fee − discount` holds for
/// every stored order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,

    /// Owning user, or the POS customer sentinel for register sales.
    pub user_id: String,

    /// Line items at time of purchase, each carrying its cost snapshot.
    pub items: Vec<CartLine>,

    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub service_fee_cents: i64,
    pub discount: Option<Discount>,
    pub total_cents: i64,

    /// Customer-facing status.
    pub status: OrderStatus,

    /// Operational fulfillment status.
    pub fulfillment_status: FulfillmentStatus,

    pub channel: Channel,

    /// POS sales record how they were paid; online orders settle elsewhere.
    pub payment_method: Option<PaymentMethod>,

    /// Delivery address for online orders; absent for register sales.
    pub delivery_address: Option<Address>,
    pub delivery_notes: Option<String>,

    /// Warehouse staff picking the order.
    pub despachador_id: Option<String>,

    /// Delivery rider transporting the order.
    pub repartidor_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the discount amount, zero when no discount applied.
    pub fn discount_amount(&self) -> Money {
        self.discount
            .as_ref()
            .map(Discount::amount)
            .unwrap_or_else(Money::zero)
    }

    /// Checks the order total invariant:
    /// `total == subtotal + delivery_fee + service_fee − discount`.
    pub fn totals_consistent(&self) -> bool {
        let derived = Money::from_cents(self.subtotal_cents)
            + Money::from_cents(self.delivery_fee_cents)
            + Money::from_cents(self.service_fee_cents)
            - self.discount_amount();
        derived.clamp_at_zero().cents() == self.total_cents && self.total_cents >= 0
    }

    /// Builds an order from a synced POS sale.
    ///
    /// POS sales are physically complete at the register, so the order is
    /// born in terminal state on both axes and needs no picking workflow.
    pub fn from_pos_sale(sale: &PosSale, id: String, now: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: sale.user_id.clone(),
            items: sale.items.clone(),
            subtotal_cents: sale.subtotal_cents,
            // In-store sales never carry delivery or service fees.
            delivery_fee_cents: 0,
            service_fee_cents: 0,
            discount: sale.discount.clone(),
            total_cents: sale.total_cents,
            status: OrderStatus::Entregado,
            fulfillment_status: FulfillmentStatus::Entregado,
            channel: Channel::Pos,
            payment_method: Some(sale.payment_method),
            delivery_address: None,
            delivery_notes: None,
            despachador_id: None,
            repartidor_id: None,
            created_at: now,
            assigned_at: None,
            picked_up_at: None,
            delivered_at: Some(now),
        }
    }
}

// =============================================================================
// POS Sale (queued, pre-order)
// =============================================================================

/// A finalized register sale waiting in the offline queue.
///
/// Lives in the local sale queue from the moment the operator finalizes the
/// sale until the central order store acknowledges it as durably persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PosSale {
    /// POS customer sentinel, or a known shopper id.
    pub user_id: String,

    pub items: Vec<CartLine>,
    pub subtotal_cents: i64,

    /// Always zero for register sales; kept so the payload shape matches
    /// the order store's create contract.
    pub delivery_fee_cents: i64,
    pub service_fee_cents: i64,

    pub total_cents: i64,
    pub discount: Option<Discount>,
    pub payment_method: PaymentMethod,

    /// When the sale was queued (register clock).
    #[ts(as = "String")]
    pub queued_at: DateTime<Utc>,
}

impl PosSale {
    /// Builds a queued sale from finalized cart contents.
    pub fn new(
        items: Vec<CartLine>,
        subtotal: Money,
        total: Money,
        discount: Option<Discount>,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        PosSale {
            user_id: POS_CUSTOMER_ID.to_string(),
            items,
            subtotal_cents: subtotal.cents(),
            delivery_fee_cents: 0,
            service_fee_cents: 0,
            total_cents: total.cents(),
            discount,
            payment_method,
            queued_at: now,
        }
    }
}

/// A sale as it sits in the durable local queue, tagged with its
/// auto-assigned storage key.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QueuedSale {
    /// Auto-increment key assigned by the queue store. Sync deletes exactly
    /// the keys it submitted, never "everything currently there".
    pub key: i64,

    pub sale: PosSale,
}

// =============================================================================
// Stock Movements
// =============================================================================

/// The kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MovementType {
    #[serde(rename = "reception")]
    Reception,
    #[serde(rename = "sale-pos")]
    SalePos,
    #[serde(rename = "sale-online")]
    SaleOnline,
    #[serde(rename = "adjustment")]
    Adjustment,
    #[serde(rename = "return")]
    Return,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Reception => "reception",
            MovementType::SalePos => "sale-pos",
            MovementType::SaleOnline => "sale-online",
            MovementType::Adjustment => "adjustment",
            MovementType::Return => "return",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reception" => Ok(MovementType::Reception),
            "sale-pos" => Ok(MovementType::SalePos),
            "sale-online" => Ok(MovementType::SaleOnline),
            "adjustment" => Ok(MovementType::Adjustment),
            "return" => Ok(MovementType::Return),
            other => Err(format!("unknown movement type: {other}")),
        }
    }
}

/// One signed quantity change against a product: the atomic unit of the
/// inventory ledger. Append-only; never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,

    /// Positive = stock increase, negative = decrease.
    pub quantity: i64,

    pub movement_type: MovementType,

    /// e.g. "Dañado", "Factura #123", "Faltante en Picking Pedido #a1b2c3".
    pub reason: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Builds a movement with a fresh identifier.
    pub fn new(
        id: String,
        product_id: impl Into<String>,
        quantity: i64,
        movement_type: MovementType,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        StockMovement {
            id,
            product_id: product_id.into(),
            quantity,
            movement_type,
            reason,
            created_at: now,
        }
    }
}

// =============================================================================
// Returns
// =============================================================================

/// A processed return against an order.
///
/// The refund is pro-rated from the original order's (bundle-priced) line
/// totals, preserving historical pricing fidelity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRecord {
    pub id: String,
    pub order_id: String,

    /// The subset of line items returned, with returned quantities.
    pub items: Vec<CartLine>,

    pub reason: String,

    /// Whether the items went back to sellable inventory.
    pub restocked: bool,

    pub refund_cents: i64,
    pub channel: Channel,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ReturnRecord {
    /// Returns the refund amount as Money.
    #[inline]
    pub fn refund(&self) -> Money {
        Money::from_cents(self.refund_cents)
    }
}

// =============================================================================
// Expenses
// =============================================================================

/// Expense category labels used by the financial center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ExpenseCategory {
    Salarios,
    Alquiler,
    Servicios,
    Marketing,
    Suministros,
    Impuestos,
    Otros,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Salarios => "Salarios",
            ExpenseCategory::Alquiler => "Alquiler",
            ExpenseCategory::Servicios => "Servicios",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Suministros => "Suministros",
            ExpenseCategory::Impuestos => "Impuestos",
            ExpenseCategory::Otros => "Otros",
        }
    }
}

impl FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Salarios" => Ok(ExpenseCategory::Salarios),
            "Alquiler" => Ok(ExpenseCategory::Alquiler),
            "Servicios" => Ok(ExpenseCategory::Servicios),
            "Marketing" => Ok(ExpenseCategory::Marketing),
            "Suministros" => Ok(ExpenseCategory::Suministros),
            "Impuestos" => Ok(ExpenseCategory::Impuestos),
            "Otros" => Ok(ExpenseCategory::Otros),
            other => Err(format!("unknown expense category: {other}")),
        }
    }
}

/// An independent ledger line for operating costs. Not tied to orders.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub amount_cents: i64,
    pub category: ExpenseCategory,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product_without_cost(price_cents: i64) -> Product {
        Product {
            id: "P001".to_string(),
            name: "Manzanas Rojas".to_string(),
            description: None,
            category: "Frutas y Verduras".to_string(),
            weight: Some("1kg".to_string()),
            image_url: None,
            tags: vec![],
            price_cents,
            cost_cents: None,
            discount_bps: None,
            bundle_offers: vec![],
            stock: 100,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cost_defaults_to_seventy_percent() {
        let product = product_without_cost(1000);
        assert_eq!(product.cost_or_default().cents(), 700);
    }

    #[test]
    fn test_explicit_cost_wins() {
        let mut product = product_without_cost(1000);
        product.cost_cents = Some(450);
        assert_eq!(product.cost_or_default().cents(), 450);
    }

    #[test]
    fn test_cart_line_snapshot_is_frozen() {
        let mut product = product_without_cost(1000);
        product.cost_cents = Some(700);

        let line = CartLine::from_product(&product, Utc::now());
        assert_eq!(line.cost_cents, 700);
        assert_eq!(line.quantity, 1);

        // A later catalog cost change must not reach back into the line.
        product.cost_cents = Some(900);
        assert_eq!(line.cost_cents, 700);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Recibido,
            OrderStatus::EnPreparacion,
            OrderStatus::ListoParaRecoger,
            OrderStatus::EnCamino,
            OrderStatus::Entregado,
            OrderStatus::Cancelado,
            OrderStatus::Devuelto,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }

        for status in [
            FulfillmentStatus::NoPreparado,
            FulfillmentStatus::EnPreparacion,
            FulfillmentStatus::ListoParaDespacho,
            FulfillmentStatus::ListoConFaltantes,
            FulfillmentStatus::EnRuta,
            FulfillmentStatus::Entregado,
            FulfillmentStatus::Cancelado,
        ] {
            assert_eq!(
                status.as_str().parse::<FulfillmentStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_status_serde_uses_spanish_wire_strings() {
        let json = serde_json::to_string(&OrderStatus::EnPreparacion).unwrap();
        assert_eq!(json, "\"En preparación\"");

        let parsed: FulfillmentStatus =
            serde_json::from_str("\"Listo con faltantes\"").unwrap();
        assert_eq!(parsed, FulfillmentStatus::ListoConFaltantes);
    }

    #[test]
    fn test_ready_for_dispatch() {
        assert!(FulfillmentStatus::ListoParaDespacho.is_ready_for_dispatch());
        assert!(FulfillmentStatus::ListoConFaltantes.is_ready_for_dispatch());
        assert!(!FulfillmentStatus::EnPreparacion.is_ready_for_dispatch());
        assert!(!FulfillmentStatus::EnRuta.is_ready_for_dispatch());
    }

    #[test]
    fn test_order_from_pos_sale_is_terminal() {
        let product = product_without_cost(1000);
        let line = CartLine::from_product(&product, Utc::now());
        let sale = PosSale::new(
            vec![line],
            Money::from_cents(1000),
            Money::from_cents(1000),
            None,
            PaymentMethod::Cash,
            Utc::now(),
        );

        let order = Order::from_pos_sale(&sale, "order-1".to_string(), Utc::now());
        assert_eq!(order.status, OrderStatus::Entregado);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Entregado);
        assert_eq!(order.channel, Channel::Pos);
        assert_eq!(order.delivery_fee_cents, 0);
        assert_eq!(order.service_fee_cents, 0);
        assert!(order.delivered_at.is_some());
        assert!(order.totals_consistent());
    }

    #[test]
    fn test_totals_consistent() {
        let product = product_without_cost(20000);
        let line = CartLine::from_product(&product, Utc::now());
        let mut order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            items: vec![line],
            subtotal_cents: 20000,
            delivery_fee_cents: 1000,
            service_fee_cents: 400,
            discount: Some(Discount {
                code: "PROMO10".to_string(),
                amount_cents: 2000,
            }),
            total_cents: 19400,
            status: OrderStatus::Recibido,
            fulfillment_status: FulfillmentStatus::NoPreparado,
            channel: Channel::Online,
            payment_method: None,
            delivery_address: None,
            delivery_notes: None,
            despachador_id: None,
            repartidor_id: None,
            created_at: Utc::now(),
            assigned_at: None,
            picked_up_at: None,
            delivered_at: None,
        };
        assert!(order.totals_consistent());

        order.total_cents = 19399;
        assert!(!order.totals_consistent());
    }
}
