//! Request and response objects exchanged with the storefront API.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_types::{AddOn, CartItem, DeliveryMethod, OrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
}

impl NewAccount {
    pub fn credentials(&self) -> Credentials {
        Credentials { email: self.email.clone(), password: self.password.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A successful login, as far as the client is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub token: String,
    /// The display name the server has on record, if it sent one.
    pub full_name: Option<String>,
}

//--------------------------------------    OrderItemRequest   ---------------------------------------------------------
/// A single line of an order creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub menu_item_id: Value,
    pub quantity: u32,
    /// The chosen size, or an empty string.
    pub size: String,
    /// The full add-on objects; the order API does not accept bare ids here.
    #[serde(rename = "AddOns")]
    pub add_ons: Vec<AddOn>,
}

impl From<&CartItem> for OrderItemRequest {
    fn from(item: &CartItem) -> Self {
        Self {
            menu_item_id: item.menu_item.id.to_json(),
            quantity: item.quantity,
            size: item.chosen_size().unwrap_or_default().to_string(),
            add_ons: item.add_ons.clone(),
        }
    }
}

//--------------------------------------     NewOrderRequest   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub delivery_method: DeliveryMethod,
}

impl NewOrderRequest {
    pub fn from_cart(items: &[CartItem]) -> Self {
        Self { items: items.iter().map(OrderItemRequest::from).collect(), delivery_method: DeliveryMethod::Pickup }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
