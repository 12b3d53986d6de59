//! # Cart Aggregate
//!
//! The mutable collection of line items for one in-progress transaction —
//! an online cart or a POS sale. All mutations are synchronous and touch
//! only the in-memory collection; totals are derived through the pricing
//! engine on demand, never stored.
//!
//! ## Invariants
//! - No line ever has quantity ≤ 0 (removal is the canonical representation)
//! - Cost snapshots are captured once and never overwritten
//! - At most one promo discount is active; applying a new code replaces it
//! - Maximum distinct lines and per-line quantity are bounded

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{self, CartTotals};
use crate::types::{CartLine, Channel, Discount, Product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// The cart aggregate.
///
/// Owns its `CartLine`s exclusively until checkout; at checkout the caller
/// takes a snapshot (`snapshot_lines`) whose ownership transfers to the
/// created order or queued POS sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Line items. Order among lines is display-only.
    lines: Vec<CartLine>,

    /// The active promo discount, if any.
    discount: Option<Discount>,

    /// When the cart was created/last cleared.
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            discount: None,
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart.
    ///
    /// If the product is already present its quantity is bumped by one and
    /// the existing cost snapshot is kept; otherwise a new line is created
    /// with quantity 1 and a freshly captured cost snapshot.
    pub fn add_item(&mut self, product: &Product) -> CoreResult<()> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let new_qty = line.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.lines.push(CartLine::from_product(product, Utc::now()));
        Ok(())
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Sets a line's quantity. A quantity of zero or below removes the line
    /// entirely — the aggregate never holds a zero-quantity line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ProductNotInCart(product_id.to_string())),
        }
    }

    /// Drops all lines and any active discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = None;
        self.created_at = Utc::now();
    }

    /// Applies a promo code against the current subtotal.
    ///
    /// A valid code replaces any previously applied discount. An invalid
    /// code clears the discount and reports the rejection — it is never
    /// silently ignored, and the cart lines are untouched either way.
    pub fn apply_promo_code(&mut self, code: &str) -> CoreResult<Discount> {
        match pricing::resolve_promo_code(code, self.subtotal()) {
            Ok(discount) => {
                self.discount = Some(discount.clone());
                Ok(discount)
            }
            Err(err) => {
                self.discount = None;
                Err(err)
            }
        }
    }

    /// Removes the active promo discount.
    pub fn clear_promo_code(&mut self) {
        self.discount = None;
    }

    /// Replaces the discount with an operator-entered POS discount.
    pub fn set_discount(&mut self, discount: Option<Discount>) {
        self.discount = discount;
    }

    /// The active discount, if any.
    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    /// Current subtotal (sum of bundle-priced line totals).
    pub fn subtotal(&self) -> Money {
        pricing::subtotal(&self.lines)
    }

    /// Full totals for the given channel, derived on demand.
    pub fn totals(&self, channel: Channel) -> CartTotals {
        pricing::cart_totals(&self.lines, channel, self.discount.as_ref())
    }

    /// Read access to the lines.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Clones the lines for transfer into an order or queued sale.
    pub fn snapshot_lines(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total unit count across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BundleOffer;

    fn product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: None,
            category: "Despensa".to_string(),
            weight: None,
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
    fn test_add_item_inserts_with_quantity_one() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 1000)).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
        // Cost snapshot captured at 70% of price by default.
        assert_eq!(cart.lines()[0].cost_cents, 700);
    }

    #[test]
    fn test_add_same_product_bumps_quantity_not_cost() {
        let mut p = product("P001", 1000);
        p.cost_cents = Some(700);

        let mut cart = Cart::new();
        cart.add_item(&p).unwrap();

        // Catalog cost changes between the two adds.
        p.cost_cents = Some(900);
        cart.add_item(&p).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        // Original snapshot survives.
        assert_eq!(cart.lines()[0].cost_cents, 700);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 1000)).unwrap();

        cart.set_quantity("P001", 0).unwrap();
        assert!(cart.is_empty());

        // Negative behaves the same way.
        cart.add_item(&product("P002", 500)).unwrap();
        cart.set_quantity("P002", -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_product() {
        let mut cart = Cart::new();
        let err = cart.set_quantity("P404", 2).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotInCart(_)));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 1000)).unwrap();
        cart.add_item(&product("P002", 500)).unwrap();

        cart.remove_item("P001").unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines()[0].product_id, "P002");

        assert!(cart.remove_item("P001").is_err());
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 1000)).unwrap();

        let err = cart.set_quantity("P001", MAX_ITEM_QUANTITY + 1).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));

        // Failed mutation leaves the line unchanged.
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_clear_drops_lines_and_discount() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 20000)).unwrap();
        cart.apply_promo_code("PROMO10").unwrap();
        assert!(cart.discount().is_some());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.discount().is_none());
    }

    #[test]
    fn test_promo_code_applies_ten_percent_of_subtotal() {
        let mut cart = Cart::new();
        let p = product("P001", 20000);
        cart.add_item(&p).unwrap(); // subtotal 200.00

        let discount = cart.apply_promo_code("PROMO10").unwrap();
        assert_eq!(discount.amount_cents, 2000);

        let totals = cart.totals(Channel::Online);
        // 200.00 + 10.00 delivery + 4.00 service − 20.00 discount
        assert_eq!(totals.total_cents, 19400);
    }

    #[test]
    fn test_invalid_promo_code_clears_discount_and_reports() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 20000)).unwrap();
        cart.apply_promo_code("PROMO10").unwrap();

        let err = cart.apply_promo_code("BOGUS").unwrap_err();
        assert!(matches!(err, CoreError::UnknownPromoCode(_)));
        assert!(cart.discount().is_none());
        // Lines untouched.
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_new_promo_replaces_previous() {
        let mut cart = Cart::new();
        cart.add_item(&product("P001", 10000)).unwrap();
        cart.apply_promo_code("PROMO10").unwrap();

        // Re-applying after the subtotal changed recomputes the amount.
        cart.add_item(&product("P002", 10000)).unwrap();
        let discount = cart.apply_promo_code("promo10").unwrap();
        assert_eq!(discount.amount_cents, 2000);
        assert_eq!(cart.discount().unwrap().amount_cents, 2000);
    }

    #[test]
    fn test_totals_never_cached() {
        let mut cart = Cart::new();
        let mut p = product("P007", 1000);
        p.bundle_offers = vec![BundleOffer { quantity: 6, price_cents: 5500 }];

        cart.add_item(&p).unwrap();
        assert_eq!(cart.totals(Channel::Pos).subtotal_cents, 1000);

        cart.set_quantity("P007", 6).unwrap();
        assert_eq!(cart.totals(Channel::Pos).subtotal_cents, 5500);
    }
}
