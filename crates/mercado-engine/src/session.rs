//! # Cart Session
//!
//! The per-session owner of a cart aggregate.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<_>>` because command handlers may run
//! concurrently, but only one may mutate the cart at a time — within one
//! client, operations against the same cart are strictly serialized. Cart
//! math is synchronous and local; it never blocks on the network.

use std::sync::{Arc, Mutex};

use mercado_core::{Cart, CartTotals, Channel};

/// A session-scoped handle to one cart (one browser tab or POS terminal).
///
/// Constructed once per session and passed by reference to whatever needs
/// it; there is no ambient shared cart.
#[derive(Debug, Clone, Default)]
pub struct CartSession {
    cart: Arc<Mutex<Cart>>,
}

impl CartSession {
    /// Creates a new session with an empty cart.
    pub fn new() -> Self {
        CartSession {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let count = session.with_cart(|cart| cart.item_count());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// session.with_cart_mut(|cart| cart.add_item(&product))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }

    /// Derived totals for the given channel.
    pub fn totals(&self, channel: Channel) -> CartTotals {
        self.with_cart(|cart| cart.totals(channel))
    }

    /// Drops all lines and any discount.
    pub fn clear(&self) {
        self.with_cart_mut(|cart| cart.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mercado_core::Product;

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
            stock: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_serializes_mutations() {
        let session = CartSession::new();
        let p = product("P001", 1000);

        session.with_cart_mut(|cart| cart.add_item(&p)).unwrap();
        session.with_cart_mut(|cart| cart.add_item(&p)).unwrap();

        assert_eq!(session.with_cart(|cart| cart.total_quantity()), 2);
        assert_eq!(session.totals(Channel::Pos).subtotal_cents, 2000);
    }

    #[test]
    fn test_clones_share_the_same_cart() {
        let session = CartSession::new();
        let copy = session.clone();

        session
            .with_cart_mut(|cart| cart.add_item(&product("P001", 500)))
            .unwrap();

        assert_eq!(copy.with_cart(|cart| cart.item_count()), 1);

        copy.clear();
        assert!(session.with_cart(|cart| cart.is_empty()));
    }
}
