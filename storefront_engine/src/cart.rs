//! The customer's in-progress selection of items.
//!
//! The cart is purely in-memory. It never talks to the network; the order flow reads it when an order is placed and
//! clears it once the server has accepted the order.
use log::*;
use sf_common::Price;

use crate::data_types::{AddOn, CartItem, CartItemId};

/// Sales tax applied to the cart subtotal.
pub const TAX_RATE: f64 = 0.08;

/// A partial change to a cart line. Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartItemUpdate {
    pub quantity: Option<u32>,
    pub total_price: Option<Price>,
    pub size: Option<Option<String>>,
    pub add_ons: Option<Vec<AddOn>>,
}

impl CartItemUpdate {
    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn total_price(mut self, total_price: Price) -> Self {
        self.total_price = Some(total_price);
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct CartStore {
    items: Vec<CartItem>,
    next_id: u64,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line to the cart and returns its freshly assigned local identifier.
    ///
    /// Identifiers come from a counter owned by the store, so they are unique for the lifetime of the cart even if it
    /// is cleared.
    pub fn add(&mut self, mut item: CartItem) -> CartItemId {
        self.next_id += 1;
        let id = CartItemId(self.next_id);
        if item.quantity == 0 {
            warn!("🛒️ Cart line for {} had a zero quantity. Setting it to 1", item.menu_item.name);
            item.total_price = item.unit_price();
            item.quantity = 1;
        }
        item.id = id;
        debug!("🛒️ Added {} x {} to the cart as line {id}", item.quantity, item.menu_item.name);
        self.items.push(item);
        id
    }

    /// Merges the given changes into the matching line. Does nothing if there is no such line.
    ///
    /// A quantity of zero is stored as one; lines are only ever removed explicitly.
    pub fn update(&mut self, id: CartItemId, update: CartItemUpdate) {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            trace!("🛒️ Ignoring update for unknown cart line {id}");
            return;
        };
        if let Some(q) = update.quantity {
            item.quantity = q.max(1);
        }
        if let Some(total) = update.total_price {
            item.total_price = total;
        }
        if let Some(size) = update.size {
            item.size = size;
        }
        if let Some(add_ons) = update.add_ons {
            item.add_ons = add_ons;
        }
    }

    /// Changes the quantity of a line, keeping the per-unit price exactly as it was.
    pub fn set_quantity(&mut self, id: CartItemId, quantity: u32) {
        let Some(item) = self.get(id) else {
            trace!("🛒️ Ignoring quantity change for unknown cart line {id}");
            return;
        };
        let quantity = quantity.max(1);
        let total = item.unit_price() * quantity;
        self.update(id, CartItemUpdate::default().quantity(quantity).total_price(total));
    }

    pub fn increment(&mut self, id: CartItemId) {
        if let Some(q) = self.get(id).map(|i| i.quantity) {
            self.set_quantity(id, q.saturating_add(1));
        }
    }

    /// Reduces the quantity by one. A line with a quantity of one is left as it is.
    pub fn decrement(&mut self, id: CartItemId) {
        if let Some(q) = self.get(id).map(|i| i.quantity) {
            self.set_quantity(id, q.saturating_sub(1));
        }
    }

    pub fn remove(&mut self, id: CartItemId) -> Option<CartItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        let item = self.items.remove(index);
        debug!("🛒️ Removed line {id} ({}) from the cart", item.menu_item.name);
        Some(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The total number of units in the cart, i.e. the sum of all line quantities.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn subtotal(&self) -> Price {
        self.items.iter().map(|i| i.total_price).sum()
    }

    pub fn tax(&self) -> Price {
        self.subtotal() * TAX_RATE
    }

    pub fn total(&self) -> Price {
        self.subtotal() + self.tax()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_types::{MenuItem, MenuItemId};

    fn menu_item(id: &str, price: f64) -> MenuItem {
        MenuItem {
            id: MenuItemId::from(id),
            name: format!("Item {id}"),
            description: String::new(),
            category: "Burgers".into(),
            base_price: Price::new(price),
            image: String::new(),
            sizes: vec![],
            available_add_ons: vec![AddOn::new(Some(1), "Cheese", Price::new(0.7))],
        }
    }

    #[test]
    fn item_count_is_the_sum_of_quantities() {
        let mut cart = CartStore::new();
        assert_eq!(cart.item_count(), 0);
        cart.add(CartItem::configure(&menu_item("201", 4.99), None, &[], 2));
        cart.add(CartItem::configure(&menu_item("202", 6.49), None, &["Cheese"], 3));
        let id = cart.add(CartItem::configure(&menu_item("203", 3.99), None, &[], 1));
        assert_eq!(cart.item_count(), 6);
        cart.remove(id);
        assert_eq!(cart.item_count(), 5);
        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn item_count_holds_quantities_at_the_limit() {
        let mut cart = CartStore::new();
        let a = cart.add(CartItem::configure(&menu_item("201", 0.0), None, &[], 1));
        let b = cart.add(CartItem::configure(&menu_item("202", 0.0), None, &[], 1));
        cart.set_quantity(a, u32::MAX);
        cart.set_quantity(b, u32::MAX - 1);
        cart.increment(b);
        cart.increment(b);
        assert_eq!(cart.get(b).unwrap().quantity, u32::MAX);
        assert_eq!(cart.item_count(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn ids_are_unique_even_after_clearing() {
        let mut cart = CartStore::new();
        let item = CartItem::configure(&menu_item("201", 4.99), None, &[], 1);
        let a = cart.add(item.clone());
        let b = cart.add(item.clone());
        cart.clear();
        let c = cart.add(item);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn quantity_changes_scale_the_price_linearly() {
        let mut cart = CartStore::new();
        let id = cart.add(CartItem::configure(&menu_item("202", 6.49), None, &["Cheese"], 3));
        let t = cart.get(id).unwrap().total_price;
        cart.set_quantity(id, 7);
        let item = cart.get(id).unwrap();
        assert_eq!(item.quantity, 7);
        assert_eq!(item.total_price, t / 3 * 7);
        cart.increment(id);
        assert_eq!(cart.get(id).unwrap().total_price, Price::new(7.19 * 8.0));
    }

    #[test]
    fn quantity_never_drops_below_one() {
        let mut cart = CartStore::new();
        let id = cart.add(CartItem::configure(&menu_item("201", 4.99), None, &[], 2));
        cart.decrement(id);
        cart.decrement(id);
        cart.decrement(id);
        let item = cart.get(id).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.total_price, Price::new(4.99));
        cart.set_quantity(id, 0);
        assert_eq!(cart.get(id).unwrap().quantity, 1);
        cart.update(id, CartItemUpdate::default().quantity(0));
        assert_eq!(cart.get(id).unwrap().quantity, 1);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut cart = CartStore::new();
        let id = cart.add(CartItem::configure(&menu_item("201", 4.99), None, &[], 1));
        let before = cart.items().to_vec();
        cart.update(CartItemId(999), CartItemUpdate::default().quantity(5));
        cart.set_quantity(CartItemId(999), 5);
        assert!(cart.remove(CartItemId(999)).is_none());
        assert_eq!(cart.items(), before.as_slice());
        assert!(cart.get(id).is_some());
    }

    #[test]
    fn totals() {
        let mut cart = CartStore::new();
        cart.add(CartItem::configure(&menu_item("201", 10.0), None, &[], 1));
        cart.add(CartItem::configure(&menu_item("202", 5.0), None, &[], 2));
        assert_eq!(cart.subtotal(), Price::new(20.0));
        assert_eq!(cart.tax(), Price::new(1.6));
        assert_eq!(cart.total(), Price::new(21.6));
    }
}
