use std::time::Duration;

use cucumber::{then, when};
use serde_json::json;
use storefront_engine::{
    data_types::CartItem,
    events::Notification,
    ConnectionState,
    OrderId,
    OrderStatus,
};

use crate::cucumber::StorefrontWorld;

const PATIENCE: Duration = Duration::from_secs(3);
const POLL: Duration = Duration::from_millis(10);

fn status(s: &str) -> OrderStatus {
    s.parse().expect("Not a valid order status")
}

//------------------------------------------    Actions    ------------------------------------------------------

#[when("I start the storefront")]
async fn start(world: &mut StorefrontWorld) {
    world.start_storefront().await;
}

#[when("I restart the storefront")]
async fn restart(world: &mut StorefrontWorld) {
    world.start_storefront().await;
}

#[when(expr = "I sign in with {string} and {string}")]
async fn sign_in(world: &mut StorefrontWorld, email: String, password: String) {
    let result = world.storefront().login(&email, &password).await.map(|_| ());
    world.last_error = result.err();
}

#[when(expr = "I register as {string} with {string} and {string}")]
async fn register(world: &mut StorefrontWorld, name: String, email: String, password: String) {
    let account = storefront_engine::order_objects::NewAccount { email, password, name, phone: "0123456789".into() };
    let result = world.storefront().register(account).await.map(|_| ());
    world.last_error = result.err();
}

#[when("I sign out")]
async fn sign_out(world: &mut StorefrontWorld) {
    world.storefront().logout().await;
}

#[when(expr = "I add {int} {string} to the cart")]
async fn add_to_cart(world: &mut StorefrontWorld, quantity: u32, name: String) {
    add_configured(world, quantity, name, None, vec![]);
}

#[when(expr = "I add {int} {string} in size {string} with {string} to the cart")]
async fn add_configured_to_cart(world: &mut StorefrontWorld, quantity: u32, name: String, size: String, add_on: String) {
    add_configured(world, quantity, name, Some(size), vec![add_on]);
}

fn add_configured(world: &mut StorefrontWorld, quantity: u32, name: String, size: Option<String>, add_ons: Vec<String>) {
    let sf = world.storefront();
    let item = sf
        .catalog()
        .items()
        .iter()
        .find(|i| i.name == name)
        .cloned()
        .unwrap_or_else(|| panic!("{name} is not on the menu"));
    let add_ons = add_ons.iter().map(String::as_str).collect::<Vec<&str>>();
    let line = CartItem::configure(&item, size.as_deref(), &add_ons, quantity);
    sf.cart_mut().add(line);
}

#[when("I place the order")]
async fn place_order(world: &mut StorefrontWorld) {
    let result = world.storefront().place_order().await;
    world.last_error = result.err();
}

#[when("I refresh my order history")]
async fn refresh(world: &mut StorefrontWorld) {
    let result = world.storefront().refresh_history().await.map(|_| ());
    world.last_error = result.err();
}

#[when(expr = "the kitchen rejects orders with {string}")]
async fn kitchen_rejects(world: &mut StorefrontWorld, message: String) {
    world.kitchen.reject_orders(&message);
}

#[when(expr = "the kitchen marks order {word} as {word}")]
async fn kitchen_advances(world: &mut StorefrontWorld, id: String, new_status: String) {
    world.kitchen.advance(&id, status(&new_status));
}

#[when(expr = "an old update marking order {word} as {word} arrives late")]
async fn stale_update(world: &mut StorefrontWorld, id: String, old_status: String) {
    world.kitchen.replay_stale(&id, status(&old_status));
}

#[when(expr = "an update marking order {word} as {word} arrives without a timestamp")]
async fn undated_update(world: &mut StorefrontWorld, id: String, new_status: String) {
    world.kitchen.send_raw("OrderUpdated", json!({ "data": { "id": id, "status": new_status } }));
}

#[when("the kitchen pushes an order update without an order id")]
async fn malformed_update(world: &mut StorefrontWorld) {
    world.kitchen.send_raw("OrderUpdated", json!({ "data": { "status": "completed", "items": [] } }));
}

#[when(expr = "the kitchen forgets order {word}")]
async fn kitchen_forgets(world: &mut StorefrontWorld, id: String) {
    world.kitchen.forget(&id);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut StorefrontWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

//------------------------------------------    Checks     ------------------------------------------------------

#[then(expr = "the cart holds {int} items")]
async fn cart_count(world: &mut StorefrontWorld, count: u64) {
    assert_eq!(world.storefront().cart().item_count(), count);
}

#[then("the cart is empty")]
async fn cart_empty(world: &mut StorefrontWorld) {
    assert!(world.storefront().cart().is_empty(), "The cart still holds items");
}

#[then(expr = "the cart total is {string}")]
async fn cart_total(world: &mut StorefrontWorld, total: String) {
    assert_eq!(world.storefront().cart().total().to_string(), total);
}

#[then("I am asked to sign in")]
async fn asked_to_sign_in(world: &mut StorefrontWorld) {
    let needs_sign_in = world.last_error.as_ref().map(|e| e.requires_sign_in()).unwrap_or(false);
    assert!(needs_sign_in, "Expected a sign-in error, got {:?}", world.last_error);
    wait_for_notification(world, |n| matches!(n, Notification::AuthenticationRequired)).await;
}

#[then(expr = "I am told {string}")]
async fn told(world: &mut StorefrontWorld, message: String) {
    wait_for_notification(world, |n| n.to_string() == message).await;
}

#[then(expr = "the last error says {string}")]
async fn last_error(world: &mut StorefrontWorld, message: String) {
    let error = world.last_error.as_ref().expect("There was no error");
    assert_eq!(error.user_message(), message);
}

#[then(expr = "the kitchen has received {int} order(s)")]
async fn kitchen_orders(world: &mut StorefrontWorld, count: usize) {
    assert_eq!(world.kitchen.orders_received(), count);
}

#[then(expr = "the kitchen was told that order {word} is {word}")]
async fn kitchen_told(world: &mut StorefrontWorld, id: String, expected: String) {
    let expected = (id, status(&expected));
    let deadline = tokio::time::Instant::now() + PATIENCE;
    while !world.kitchen.status_updates().contains(&expected) {
        assert!(tokio::time::Instant::now() < deadline, "The kitchen never heard that {} is {}", expected.0, expected.1);
        tokio::time::sleep(POLL).await;
    }
}

#[then("the kitchen was not sent any status updates")]
async fn kitchen_not_told(world: &mut StorefrontWorld) {
    assert!(world.kitchen.status_updates().is_empty(), "Updates: {:?}", world.kitchen.status_updates());
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut StorefrontWorld, id: String, expected: String) {
    let expected = status(&expected);
    let id = OrderId::from(id);
    let deadline = tokio::time::Instant::now() + PATIENCE;
    loop {
        let current = world.storefront().order(&id).await.map(|o| o.status);
        if current == Some(expected) {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "Order {id} is {current:?}, expected {expected}");
        tokio::time::sleep(POLL).await;
    }
}

#[then(expr = "my orders are {string}")]
async fn my_orders(world: &mut StorefrontWorld, expected: String) {
    let ids = world.storefront().orders().await.iter().map(|o| o.id.as_str().to_string()).collect::<Vec<_>>();
    assert_eq!(ids.join(", "), expected);
}

#[then("I have no orders")]
async fn no_orders(world: &mut StorefrontWorld) {
    assert!(world.storefront().orders().await.is_empty());
}

#[then(expr = "I am signed in as {string}")]
async fn signed_in_as(world: &mut StorefrontWorld, name: String) {
    let identity = world.storefront().identity().cloned().expect("Nobody is signed in");
    assert_eq!(identity.name, name);
}

#[then("I am signed out")]
async fn signed_out(world: &mut StorefrontWorld) {
    assert!(world.storefront().identity().is_none());
}

#[then("the push channel is connected")]
async fn push_connected(world: &mut StorefrontWorld) {
    assert_eq!(world.storefront().connection_state(), ConnectionState::Connected);
    assert!(world.kitchen.subscriber_count() > 0);
}

#[then("the push channel is disconnected")]
async fn push_disconnected(world: &mut StorefrontWorld) {
    assert_eq!(world.storefront().connection_state(), ConnectionState::Disconnected);
}

async fn wait_for_notification<F: Fn(&Notification) -> bool>(world: &StorefrontWorld, check: F) {
    let deadline = tokio::time::Instant::now() + PATIENCE;
    loop {
        let notifications = world.notifications();
        if notifications.iter().any(&check) {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "Notification not raised. Got {notifications:?}");
        tokio::time::sleep(POLL).await;
    }
}
