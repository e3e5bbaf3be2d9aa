//! Customer cart held on the client until checkout.
//!
//! `Cart` is the pure line collection. `CartSession` binds a cart to a
//! session key and writes every mutation through to a `CartStorage`, so a
//! reload restores the cart. Stock values on the lines are whatever the
//! catalog reported at the last fetch; checkout re-checks them.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::{
    error::{AppError, Result},
    models::{CartLine, CartTotals, CheckoutLine, ProductAvailability},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
    delivery_fee: Decimal,
}

impl Cart {
    pub fn new(delivery_fee: Decimal) -> Self {
        Self {
            lines: Vec::new(),
            delivery_fee,
        }
    }

    pub fn from_lines(lines: Vec<CartLine>, delivery_fee: Decimal) -> Self {
        Self {
            lines,
            delivery_fee,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` of `product`, clamped to its known stock. Returns the
    /// resulting line quantity, or `None` when the product cannot be bought.
    pub fn add_item(&mut self, product: &ProductAvailability, quantity: i32) -> Option<i32> {
        if !product.active || product.stock < 1 {
            return None;
        }
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            line.stock = product.stock;
            line.quantity = line.quantity.saturating_add(quantity).min(product.stock);
            return Some(line.quantity);
        }

        let quantity = quantity.min(product.stock);
        self.lines.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            price: product.price,
            stock: product.stock,
            seller_id: product.seller_id,
        });
        Some(quantity)
    }

    /// Returns false when the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: i32, quantity: i32) -> bool {
        if quantity < 1 {
            return self.remove_item(product_id);
        }

        match self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = quantity.min(line.stock).max(1);
                true
            }
            None => false,
        }
    }

    pub fn remove_item(&mut self, product_id: i32) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn compute_totals(&self) -> CartTotals {
        let subtotal = self
            .lines
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum::<Decimal>();

        CartTotals {
            subtotal,
            delivery_fee: self.delivery_fee,
            total: subtotal + self.delivery_fee,
        }
    }

    /// Advisory only: checkout always creates a single order.
    pub fn is_single_seller(&self) -> bool {
        let sellers: HashSet<i32> = self.lines.iter().map(|line| line.seller_id).collect();
        sellers.len() == 1
    }

    /// Refreshes lines from current catalog data. Lines whose product is gone,
    /// inactive or sold out are dropped; quantities are clamped to stock.
    /// Returns true when anything changed.
    pub fn reconcile(&mut self, catalog: &HashMap<i32, ProductAvailability>) -> bool {
        let before = self.lines.clone();

        self.lines.retain_mut(|line| match catalog.get(&line.product_id) {
            Some(product) if product.active && product.stock > 0 => {
                line.name = product.name.clone();
                line.price = product.price;
                line.stock = product.stock;
                line.seller_id = product.seller_id;
                line.quantity = line.quantity.clamp(1, product.stock);
                true
            }
            _ => false,
        });

        self.lines != before
    }

    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.lines
            .iter()
            .map(|line| CheckoutLine {
                product_id: line.product_id,
                quantity: line.quantity,
                price: Some(line.price),
            })
            .collect()
    }
}

/// Durable client-side storage keyed by session, holding the cart as JSON.
pub trait CartStorage {
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn save(&mut self, key: &str, payload: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCartStorage {
    entries: HashMap<String, String>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, payload: &str) -> Result<()> {
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

pub struct CartSession<S: CartStorage> {
    key: String,
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartSession<S> {
    /// Restores the cart stored under `key`. An unreadable entry starts an empty cart.
    pub fn open(key: impl Into<String>, storage: S, delivery_fee: Decimal) -> Result<Self> {
        let key = key.into();
        let lines = match storage.load(&key)? {
            Some(payload) => match serde_json::from_str::<Vec<CartLine>>(&payload) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(session = %key, "Discarding unreadable cart: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self {
            key,
            cart: Cart::from_lines(lines, delivery_fee),
            storage,
        })
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn add_item(&mut self, product: &ProductAvailability, quantity: i32) -> Result<Option<i32>> {
        let added = self.cart.add_item(product, quantity);
        self.persist()?;
        Ok(added)
    }

    pub fn update_quantity(&mut self, product_id: i32, quantity: i32) -> Result<bool> {
        let found = self.cart.update_quantity(product_id, quantity);
        self.persist()?;
        Ok(found)
    }

    pub fn remove_item(&mut self, product_id: i32) -> Result<bool> {
        let removed = self.cart.remove_item(product_id);
        self.persist()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.cart.clear();
        self.storage.remove(&self.key)
    }

    pub fn reconcile(&mut self, catalog: &HashMap<i32, ProductAvailability>) -> Result<bool> {
        let changed = self.cart.reconcile(catalog);
        self.persist()?;
        Ok(changed)
    }

    /// Ends the session's cart after the server accepted the checkout.
    pub fn complete_checkout(&mut self) -> Result<()> {
        self.clear()
    }

    fn persist(&mut self) -> Result<()> {
        if self.cart.is_empty() {
            return self.storage.remove(&self.key);
        }

        let payload = serde_json::to_string(self.cart.lines())
            .map_err(|e| AppError::InternalError(format!("Failed to serialize cart: {}", e)))?;
        self.storage.save(&self.key, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee() -> Decimal {
        Decimal::from(13000)
    }

    fn product(id: i32, price: i64, stock: i32, seller_id: i32) -> ProductAvailability {
        ProductAvailability {
            id,
            name: format!("Beras {}", id),
            price: Decimal::from(price),
            stock,
            active: true,
            seller_id,
        }
    }

    #[test]
    fn add_clamps_new_line_to_stock() {
        let mut cart = Cart::new(fee());
        assert_eq!(cart.add_item(&product(7, 10000, 5, 1), 8), Some(5));
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn add_raises_zero_quantity_to_one() {
        let mut cart = Cart::new(fee());
        assert_eq!(cart.add_item(&product(7, 10000, 5, 1), 0), Some(1));
    }

    #[test]
    fn add_existing_accumulates_up_to_stock() {
        let mut cart = Cart::new(fee());
        let rice = product(7, 10000, 5, 1);
        cart.add_item(&rice, 2);
        assert_eq!(cart.add_item(&rice, 2), Some(4));
        assert_eq!(cart.add_item(&rice, 2), Some(5));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn sold_out_or_inactive_products_are_not_added() {
        let mut cart = Cart::new(fee());
        assert_eq!(cart.add_item(&product(7, 10000, 0, 1), 1), None);

        let mut hidden = product(8, 10000, 5, 1);
        hidden.active = false;
        assert_eq!(cart.add_item(&hidden, 1), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_below_one_removes_line() {
        let mut cart = Cart::new(fee());
        cart.add_item(&product(7, 10000, 5, 1), 2);
        assert!(cart.update_quantity(7, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_clamps_to_known_stock() {
        let mut cart = Cart::new(fee());
        cart.add_item(&product(7, 10000, 5, 1), 1);
        assert!(cart.update_quantity(7, 9));
        assert_eq!(cart.lines()[0].quantity, 5);
        assert!(!cart.update_quantity(8, 1));
    }

    #[test]
    fn totals_add_flat_delivery_fee() {
        let mut cart = Cart::new(fee());
        cart.add_item(&product(7, 10000, 5, 1), 2);
        cart.add_item(&product(8, 2500, 5, 1), 1);

        let totals = cart.compute_totals();
        assert_eq!(totals.subtotal, Decimal::from(22500));
        assert_eq!(totals.delivery_fee, Decimal::from(13000));
        assert_eq!(totals.total, Decimal::from(35500));
        assert_eq!(totals, cart.compute_totals());
    }

    #[test]
    fn empty_cart_totals_only_delivery_fee() {
        let totals = Cart::new(fee()).compute_totals();
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, fee());
    }

    #[test]
    fn seller_partition() {
        let mut cart = Cart::new(fee());
        assert!(!cart.is_single_seller());
        cart.add_item(&product(7, 10000, 5, 1), 1);
        cart.add_item(&product(8, 10000, 5, 1), 1);
        assert!(cart.is_single_seller());
        cart.add_item(&product(9, 10000, 5, 2), 1);
        assert!(!cart.is_single_seller());
    }

    #[test]
    fn reconcile_refreshes_and_drops_lines() {
        let mut cart = Cart::new(fee());
        cart.add_item(&product(7, 10000, 5, 1), 4);
        cart.add_item(&product(8, 2500, 5, 1), 1);
        cart.add_item(&product(9, 2500, 5, 1), 1);

        let catalog: HashMap<i32, ProductAvailability> = [
            (7, product(7, 12000, 2, 1)),
            (8, product(8, 2500, 0, 1)),
        ]
        .into_iter()
        .collect();

        assert!(cart.reconcile(&catalog));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].price, Decimal::from(12000));
        assert!(!cart.reconcile(&catalog));
    }

    #[test]
    fn session_writes_through_and_restores() {
        let mut session = CartSession::open("sess-1", MemoryCartStorage::new(), fee()).unwrap();
        session.add_item(&product(7, 10000, 5, 1), 2).unwrap();
        assert!(session.storage().load("sess-1").unwrap().is_some());

        let storage = session.storage().clone();
        let restored = CartSession::open("sess-1", storage, fee()).unwrap();
        assert_eq!(restored.cart().lines(), session.cart().lines());

        let other = CartSession::open("sess-2", restored.storage().clone(), fee()).unwrap();
        assert!(other.cart().is_empty());
    }

    #[test]
    fn removing_last_line_clears_storage_entry() {
        let mut session = CartSession::open("sess-1", MemoryCartStorage::new(), fee()).unwrap();
        session.add_item(&product(7, 10000, 5, 1), 2).unwrap();
        assert!(session.remove_item(7).unwrap());
        assert!(session.storage().load("sess-1").unwrap().is_none());
    }

    #[test]
    fn completed_checkout_clears_cart() {
        let mut session = CartSession::open("sess-1", MemoryCartStorage::new(), fee()).unwrap();
        session.add_item(&product(7, 10000, 5, 1), 2).unwrap();
        session.complete_checkout().unwrap();
        assert!(session.cart().is_empty());
        assert!(session.storage().load("sess-1").unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_starts_empty() {
        let mut storage = MemoryCartStorage::new();
        storage.save("sess-1", "{not json").unwrap();
        let session = CartSession::open("sess-1", storage, fee()).unwrap();
        assert!(session.cart().is_empty());
    }
}
