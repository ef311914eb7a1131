//! An in-memory stand-in for the order service and its push hub.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures_util::{stream, StreamExt};
use log::*;
use serde_json::json;
use storefront_engine::{
    data_types::{CartItem, DeliveryMethod, MenuItem},
    order_objects::{Credentials, LoginResult, NewAccount, NewOrderRequest},
    traits::{HubMessage, HubStream, PushError},
    ApiError,
    Order,
    OrderId,
    OrderStatus,
    PushTransport,
    StorefrontApi,
};
use tokio::sync::mpsc;

type Frame = Result<HubMessage, PushError>;

#[derive(Debug, Default)]
struct KitchenState {
    menu: Vec<MenuItem>,
    /// email -> (password, name)
    accounts: HashMap<String, (String, String)>,
    /// token -> email
    tokens: HashMap<String, String>,
    orders: HashMap<String, Vec<Order>>,
    next_order: u64,
    rejection: Option<String>,
    orders_received: usize,
    status_updates: Vec<(String, OrderStatus)>,
    subscribers: Vec<(String, mpsc::UnboundedSender<Frame>)>,
}

#[derive(Debug, Clone, Default)]
pub struct Kitchen {
    state: Arc<Mutex<KitchenState>>,
}

impl Kitchen {
    fn state(&self) -> MutexGuard<'_, KitchenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn api(&self) -> KitchenApi {
        KitchenApi { kitchen: self.clone() }
    }

    pub fn hub(&self) -> KitchenHub {
        KitchenHub { kitchen: self.clone() }
    }

    pub fn set_menu(&self, menu: Vec<MenuItem>) {
        self.state().menu = menu;
    }

    pub fn add_account(&self, email: &str, password: &str, name: &str) {
        self.state().accounts.insert(email.to_string(), (password.to_string(), name.to_string()));
    }

    pub fn reject_orders(&self, message: &str) {
        self.state().rejection = Some(message.to_string());
    }

    pub fn orders_received(&self) -> usize {
        self.state().orders_received
    }

    pub fn status_updates(&self) -> Vec<(String, OrderStatus)> {
        self.state().status_updates.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        let state = self.state();
        state.subscribers.iter().filter(|(_, tx)| !tx.is_closed()).count()
    }

    /// Records an order for `email` directly, as if it had been placed in an earlier session.
    pub fn seed_order(&self, email: &str, id: &str, status: OrderStatus, age_minutes: i64) {
        let now = Utc::now();
        let order = Order {
            id: OrderId::from(id),
            items: vec![],
            total_amount: 0.0.into(),
            delivery_method: DeliveryMethod::Pickup,
            status,
            created_at: now - Duration::minutes(age_minutes),
            updated_at: now - Duration::minutes(age_minutes),
            updated_at_known: true,
        };
        self.state().orders.entry(email.to_string()).or_default().push(order);
    }

    /// Moves an order to `status` on the server and announces the change to every connected client.
    pub fn advance(&self, id: &str, status: OrderStatus) {
        let mut state = self.state();
        let Some(order) = state.orders.values_mut().flatten().find(|o| o.id.as_str() == id) else {
            panic!("The kitchen has no order {id}");
        };
        order.status = status;
        order.updated_at = later_than(order.updated_at);
        let payload = json!({ "data": order });
        state.broadcast("OrderUpdated", payload);
    }

    /// Replays an update for `id` that is older than what the server last sent.
    pub fn replay_stale(&self, id: &str, status: OrderStatus) {
        let mut state = self.state();
        let Some(order) = state.orders.values().flatten().find(|o| o.id.as_str() == id).cloned() else {
            panic!("The kitchen has no order {id}");
        };
        let mut stale = order;
        stale.status = status;
        stale.updated_at -= Duration::seconds(30);
        state.broadcast("OrderUpdated", json!(stale));
    }

    /// Removes an order from the server's records without telling anyone.
    pub fn forget(&self, id: &str) {
        for orders in self.state().orders.values_mut() {
            orders.retain(|o| o.id.as_str() != id);
        }
    }

    pub fn send_raw(&self, target: &str, payload: serde_json::Value) {
        self.state().broadcast(target, payload);
    }

    fn authenticate(&self, token: &str) -> Result<String, ApiError> {
        self.state().tokens.get(token).cloned().ok_or(ApiError::Unauthorized)
    }
}

impl KitchenState {
    fn broadcast(&mut self, target: &str, payload: serde_json::Value) {
        self.subscribers.retain(|(_, tx)| !tx.is_closed());
        for (_, tx) in &self.subscribers {
            let message = HubMessage::Invocation { target: target.to_string(), arguments: vec![payload.clone()] };
            let _ = tx.send(Ok(message));
        }
    }
}

/// Server clocks only move forward, even when two updates land in the same instant.
fn later_than(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(t + Duration::milliseconds(1))
}

#[derive(Debug, Clone)]
pub struct KitchenApi {
    kitchen: Kitchen,
}

#[async_trait]
impl StorefrontApi for KitchenApi {
    async fn fetch_menu(&self) -> Result<Vec<MenuItem>, ApiError> {
        Ok(self.kitchen.state().menu.clone())
    }

    async fn register(&self, account: &NewAccount) -> Result<(), ApiError> {
        let mut state = self.kitchen.state();
        if state.accounts.contains_key(&account.email) {
            return Err(ApiError::Rejected { status: 400, message: "Email is already registered".into() });
        }
        state.accounts.insert(account.email.clone(), (account.password.clone(), account.name.clone()));
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, ApiError> {
        let mut state = self.kitchen.state();
        let name = match state.accounts.get(&credentials.email) {
            Some((password, name)) if password == &credentials.password => name.clone(),
            _ => return Err(ApiError::Rejected { status: 400, message: "Invalid email or password".into() }),
        };
        let token = format!("token-{}-{}", credentials.email, state.tokens.len() + 1);
        state.tokens.insert(token.clone(), credentials.email.clone());
        Ok(LoginResult { token, full_name: Some(name) })
    }

    async fn order_history(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let email = self.kitchen.authenticate(token)?;
        Ok(self.kitchen.state().orders.get(&email).cloned().unwrap_or_default())
    }

    async fn create_order(&self, token: &str, request: &NewOrderRequest) -> Result<Order, ApiError> {
        let email = self.kitchen.authenticate(token)?;
        let mut state = self.kitchen.state();
        state.orders_received += 1;
        if let Some(message) = state.rejection.clone() {
            return Err(ApiError::Rejected { status: 400, message });
        }
        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let id = match &line.menu_item_id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let Some(menu_item) = state.menu.iter().find(|m| m.id.as_str() == id) else {
                return Err(ApiError::Rejected { status: 400, message: format!("Menu item {id} does not exist") });
            };
            let add_ons = line.add_ons.iter().map(|a| a.name.as_str()).collect::<Vec<&str>>();
            let size = Some(line.size.as_str()).filter(|s| !s.is_empty());
            items.push(CartItem::configure(menu_item, size, &add_ons, line.quantity));
        }
        state.next_order += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::from(format!("ORD-{}", state.next_order)),
            total_amount: items.iter().map(|i| i.total_price).sum(),
            items,
            delivery_method: request.delivery_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            updated_at_known: true,
        };
        debug!("🍔️ Kitchen accepted order {} for {email}", order.id);
        state.orders.entry(email).or_default().push(order.clone());
        state.broadcast("NewOrder", json!({ "data": &order }));
        Ok(order)
    }

    async fn update_order_status(&self, token: &str, order_id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        let email = self.kitchen.authenticate(token)?;
        {
            let mut state = self.kitchen.state();
            state.status_updates.push((order_id.as_str().to_string(), status));
            let known = state.orders.get(&email).map(|o| o.iter().any(|o| &o.id == order_id)).unwrap_or(false);
            if !known {
                return Err(ApiError::Rejected { status: 404, message: "Order not found".into() });
            }
        }
        self.kitchen.advance(order_id.as_str(), status);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct KitchenHub {
    kitchen: Kitchen,
}

#[async_trait]
impl PushTransport for KitchenHub {
    async fn open(&self, token: &str) -> Result<HubStream, PushError> {
        let email = self.kitchen.authenticate(token).map_err(|e| PushError::Negotiation(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.kitchen.state().subscribers.push((email, tx));
        let frames = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|frame| (frame, rx)) });
        Ok(frames.boxed())
    }
}
