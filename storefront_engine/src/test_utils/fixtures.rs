use chrono::{DateTime, TimeZone, Utc};
use sf_common::Price;

use crate::data_types::{AddOn, CartItem, DeliveryMethod, MenuItem, MenuItemId, Order, OrderId, OrderStatus, SizeOption};

/// A fixed point in time, `minutes` after 12:00 UTC on 1 March 2025.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().unwrap_or_default() + chrono::Duration::minutes(minutes)
}

pub fn burger() -> MenuItem {
    MenuItem {
        id: MenuItemId::from("201"),
        name: "Quarter Pounder".into(),
        description: "Juicy quarter pound beef burger".into(),
        category: "Burgers".into(),
        base_price: Price::new(4.99),
        image: "burger.jpg".into(),
        sizes: vec![
            SizeOption { name: "Regular".into(), price: Price::new(0.0) },
            SizeOption { name: "Large".into(), price: Price::new(1.5) },
        ],
        available_add_ons: vec![
            AddOn::new(Some(1), "Cheese", Price::new(0.7)),
            AddOn::new(Some(2), "Make it a Meal Deal", Price::new(2.49)),
        ],
    }
}

pub fn fries() -> MenuItem {
    MenuItem {
        id: MenuItemId::from("301"),
        name: "Fries".into(),
        description: "Crispy fries".into(),
        category: "Sides".into(),
        base_price: Price::new(1.99),
        image: "fries.jpg".into(),
        sizes: vec![],
        available_add_ons: vec![],
    }
}

/// An order with a single burger, created at `at(created)` and last updated at `at(updated)`.
pub fn order(id: &str, status: OrderStatus, created: i64, updated: i64) -> Order {
    let item = CartItem::configure(&burger(), None, &[], 1);
    Order {
        id: OrderId::from(id),
        total_amount: item.total_price,
        items: vec![item],
        delivery_method: DeliveryMethod::Pickup,
        status,
        created_at: at(created),
        updated_at: at(updated),
        updated_at_known: true,
    }
}

/// The JSON the server sends for [`order`].
pub fn order_json(id: &str, status: OrderStatus, created: i64, updated: i64) -> serde_json::Value {
    serde_json::to_value(order(id, status, created, updated)).unwrap_or_default()
}
