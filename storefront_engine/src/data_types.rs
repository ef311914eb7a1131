use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sf_common::{Price, Secret};
use thiserror::Error;

/// Deserializes a JSON `null` (or a missing field, together with `#[serde(default)]`) as the type's default value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Identifiers arrive as JSON numbers from some backends and as strings from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Int(i) => i.to_string(),
            RawId::Text(s) => s,
        }
    }
}

//--------------------------------------      MenuItemId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MenuItemId(pub String);

impl<'de> Deserialize<'de> for MenuItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|id| Self(id.into()))
    }
}

impl MenuItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier in the shape the order API expects: a number where possible, the raw string otherwise.
    pub fn to_json(&self) -> Value {
        match self.0.trim().parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(self.0.clone()),
        }
    }
}

impl From<&str> for MenuItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for MenuItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       SizeOption      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeOption {
    pub name: String,
    /// The surcharge over the base price for this size
    #[serde(default)]
    pub price: Price,
}

//--------------------------------------         AddOn         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub price: Price,
}

impl AddOn {
    pub fn new<S: Into<String>>(id: Option<i64>, name: S, price: Price) -> Self {
        Self { id, name: name.into(), price }
    }
}

//--------------------------------------        MenuItem       ---------------------------------------------------------
/// An entry in the menu catalog. Menu items are never mutated by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    pub base_price: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizeOption>,
    #[serde(default, alias = "addOns", deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub available_add_ons: Vec<AddOn>,
}

impl MenuItem {
    pub fn size(&self, name: &str) -> Option<&SizeOption> {
        self.sizes.iter().find(|s| s.name == name)
    }

    pub fn add_on(&self, name: &str) -> Option<&AddOn> {
        self.available_add_ons.iter().find(|a| a.name == name)
    }

    /// The default size offered when an item is first configured (the first listed size, if any).
    pub fn default_size(&self) -> Option<&str> {
        self.sizes.first().map(|s| s.name.as_str())
    }
}

//--------------------------------------       CartItemId      ---------------------------------------------------------
/// A session-local identifier for a cart line. It never leaves the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(pub u64);

impl Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CartItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

//--------------------------------------        CartItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default)]
    pub id: CartItemId,
    pub menu_item: MenuItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub add_ons: Vec<AddOn>,
    pub total_price: Price,
}

impl CartItem {
    /// Builds a priced cart line from a menu item and the customer's selections.
    ///
    /// Unknown size or add-on names contribute nothing to the price and are not recorded. The quantity is clamped to at
    /// least one.
    pub fn configure(menu_item: &MenuItem, size: Option<&str>, add_on_names: &[&str], quantity: u32) -> Self {
        let size = size.and_then(|name| menu_item.size(name));
        let add_ons = add_on_names.iter().filter_map(|name| menu_item.add_on(name)).cloned().collect::<Vec<AddOn>>();
        let quantity = quantity.max(1);
        let unit_price = menu_item.base_price +
            size.map(|s| s.price).unwrap_or_default() +
            add_ons.iter().map(|a| a.price).sum::<Price>();
        Self {
            id: CartItemId::default(),
            menu_item: menu_item.clone(),
            size: size.map(|s| s.name.clone()),
            quantity,
            add_ons,
            total_price: unit_price * quantity,
        }
    }

    /// The chosen size, treating an empty string (as some backends send) as no size.
    pub fn chosen_size(&self) -> Option<&str> {
        self.size.as_deref().filter(|s| !s.is_empty())
    }

    pub fn unit_price(&self) -> Price {
        if self.quantity == 0 {
            return self.total_price;
        }
        self.total_price / self.quantity
    }
}

//--------------------------------------       OrderStatus     ---------------------------------------------------------
/// The lifecycle of an order. The variants are declared in lifecycle order, so `Ord` reflects progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// The order has been accepted by the server, but the kitchen has not started on it.
    Pending,
    Preparing,
    /// Ready for pickup
    Ready,
    Completed,
}

impl OrderStatus {
    pub fn next(&self) -> Option<Self> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready for Pickup",
            OrderStatus::Completed => "Completed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     DeliveryMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Customer collects the order in store. This is the only supported method.
    #[default]
    Pickup,
}

impl Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMethod::Pickup => write!(f, "Pickup"),
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" | "" => Ok(Self::Pickup),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|id| Self(id.into()))
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
/// A submitted, server-acknowledged order.
///
/// Orders only ever enter the local collection through the order book's merge rules. The `items` are snapshots taken
/// when the order was placed, and are independent of the live cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<CartItem>,
    pub total_amount: Price,
    pub delivery_method: DeliveryMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// False when the payload carried no readable `updatedAt` and `updated_at` is the time of receipt.
    #[serde(skip)]
    pub updated_at_known: bool,
}

impl Order {
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

//--------------------------------------        Identity       ---------------------------------------------------------
/// The signed-in customer. This is also the shape of the persisted session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub access_token: Secret<String>,
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new<S: Into<String>>(access_token: S, name: S, email: S) -> Self {
        Self { access_token: Secret::new(access_token.into()), name: name.into(), email: email.into() }
    }

    pub fn token(&self) -> &str {
        self.access_token.reveal()
    }

    pub fn has_credential(&self) -> bool {
        !self.access_token.reveal().trim().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn burger() -> MenuItem {
        serde_json::from_str(
            r#"{
            "id": 201, "name": "Quarter Pounder", "description": "Juicy quarter pound beef burger",
            "category": "Burgers", "basePrice": 4.99, "image": "burger.jpg",
            "sizes": [{"name": "Regular", "price": 0}, {"name": "Large", "price": 1.5}],
            "availableAddOns": [{"id": 1, "name": "Cheese", "price": 0.7}, {"id": 2, "name": "Make it a Meal Deal", "price": 2.49}]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn menu_items_accept_numeric_and_string_ids() {
        let item = burger();
        assert_eq!(item.id.as_str(), "201");
        assert_eq!(item.id.to_json(), serde_json::json!(201));
        let item: MenuItem = serde_json::from_str(
            r#"{"id": "wrap-1", "name": "Wrap", "category": "Wraps", "basePrice": 3.5, "addOns": [{"name": "Cheese", "price": 0.7}], "sizes": null, "image": null}"#,
        )
        .unwrap();
        assert_eq!(item.id.to_json(), serde_json::json!("wrap-1"));
        assert!(item.sizes.is_empty());
        assert_eq!(item.available_add_ons.len(), 1);
        assert_eq!(item.image, "");
    }

    #[test]
    fn configure_prices_selections() {
        let item = burger();
        let line = CartItem::configure(&item, Some("Large"), &["Cheese", "Pickles"], 2);
        assert_eq!(line.size.as_deref(), Some("Large"));
        assert_eq!(line.add_ons.len(), 1);
        assert_eq!(line.total_price, Price::new((4.99 + 1.5 + 0.7) * 2.0));
        assert_eq!(line.unit_price(), Price::new(4.99 + 1.5 + 0.7));

        let line = CartItem::configure(&item, Some("Huge"), &[], 0);
        assert_eq!(line.size, None);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.total_price, Price::new(4.99));
    }

    #[test]
    fn order_status_progression() {
        assert!(OrderStatus::Pending < OrderStatus::Preparing);
        assert!(OrderStatus::Preparing < OrderStatus::Ready);
        assert!(OrderStatus::Ready < OrderStatus::Completed);
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Preparing));
        assert_eq!(OrderStatus::Completed.next(), None);
        assert_eq!("Ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
        assert_eq!(" COMPLETED ".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert!("cancelled".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&OrderStatus::Preparing).unwrap(), "\"preparing\"");
    }

    #[test]
    fn identity_round_trips_with_persisted_field_names() {
        let id = Identity::new("tok123", "Alice", "alice@example.com");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!({"accessToken": "tok123", "name": "Alice", "email": "alice@example.com"}));
        assert!(format!("{id:?}").contains("****"));
        assert!(!format!("{id:?}").contains("tok123"));
        assert!(!Identity::new("  ", "Bob", "bob@example.com").has_credential());
    }
}
