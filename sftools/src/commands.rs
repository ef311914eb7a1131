use std::{future::Future, pin::Pin, time::Duration};

use anyhow::{anyhow, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use log::*;
use storefront_client::{SignalRTransport, StorefrontConfig, StorefrontHttpApi};
use storefront_engine::{
    events::{EventHandlers, EventHooks, Notification},
    order_objects::NewAccount,
    session::SessionHolder,
    ConnectionState,
    OrderFlowError,
    OrderId,
    OrderStatus,
    Storefront,
    ALL_CATEGORIES,
};

use crate::{
    formatting::{format_cart, format_identity, format_menu, format_order, format_orders},
    item_spec::ItemSpec,
    session_store::FileSessionStore,
};

pub type Shop = Storefront<StorefrontHttpApi, FileSessionStore, SignalRTransport>;

const NOTIFICATION_BUFFER: usize = 32;
const ORDER_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Builds a storefront against the configured server. Notifications are printed as they arrive.
pub fn connect(config: &StorefrontConfig) -> Result<Shop> {
    let api = StorefrontHttpApi::new(config.clone())?;
    let transport = SignalRTransport::new(config)?;
    let store = FileSessionStore::in_home_dir()?;
    let mut hooks = EventHooks::default();
    hooks.on_notification(|notification: Notification| {
        Box::pin(async move {
            println!("🔔 {notification}");
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(NOTIFICATION_BUFFER, hooks);
    let producers = handlers.producers();
    handlers.start_handlers();
    Ok(Storefront::new(api, store, transport, config.engine_config(), producers))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:5} {msg} [{elapsed}]") {
        pb.set_style(
            style.tick_strings(&["🕛 ", "🕐 ", "🕑 ", "🕒 ", "🕓 ", "🕔 ", "🕕 ", "🕖 ", "🕗 ", "🕘 ", "🕙 ", "🕚 "]),
        );
    }
    pb.set_message(message);
    pb
}

/// Turns a sign-in problem into a hint about what to run.
fn explain(e: OrderFlowError) -> anyhow::Error {
    if e.requires_sign_in() {
        anyhow!("{} Run `sftools login` first.", e.user_message())
    } else {
        anyhow!(e.user_message())
    }
}

pub async fn show_menu(config: &StorefrontConfig, category: Option<String>, search: Option<String>) -> Result<String> {
    let mut shop = connect(config)?;
    let catalog = shop.reload_catalog().await;
    if catalog.is_empty() {
        return Err(anyhow!("The menu is empty or could not be loaded from {}", config.api_base_url));
    }
    let category = category.unwrap_or_else(|| ALL_CATEGORIES.to_string());
    if !catalog.categories().contains(&category) {
        return Err(anyhow!("No category '{category}'. Categories: {}", catalog.categories().join(", ")));
    }
    let items = catalog.browse(&category, search.as_deref().unwrap_or_default());
    Ok(format!("Categories: {}\n{}", catalog.categories().join(", "), format_menu(&items)))
}

pub async fn register(
    config: &StorefrontConfig,
    email: Option<String>,
    name: Option<String>,
    phone: Option<String>,
) -> Result<String> {
    let email = prompt_if_missing(email, "Email")?;
    let name = prompt_if_missing(name, "Name")?;
    let phone = match phone {
        Some(p) => p,
        None => Input::<String>::new().with_prompt("Phone").allow_empty(true).interact_text()?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    let mut shop = connect(config)?;
    let signed_in = format_identity(shop.register(NewAccount { email, password, name, phone }).await.map_err(explain)?);
    shop.realtime().disconnect();
    Ok(signed_in)
}

pub async fn login(config: &StorefrontConfig, email: Option<String>) -> Result<String> {
    let email = prompt_if_missing(email, "Email")?;
    let password = Password::new().with_prompt("Password").interact()?;
    let mut shop = connect(config)?;
    let signed_in = format_identity(shop.login(&email, &password).await.map_err(explain)?);
    let orders = shop.orders().await.len();
    shop.realtime().disconnect();
    Ok(format!("{signed_in}. You have {orders} orders."))
}

pub async fn logout(config: &StorefrontConfig) -> Result<String> {
    let mut shop = connect(config)?;
    let was = shop.start().await.map(|i| i.email.clone());
    shop.logout().await;
    match was {
        Some(email) => Ok(format!("Signed out {email}")),
        None => Ok("Nobody was signed in".to_string()),
    }
}

pub fn whoami() -> Result<String> {
    let mut session = SessionHolder::new(FileSessionStore::in_home_dir()?);
    match session.restore() {
        Some(identity) => Ok(format_identity(identity)),
        None => Ok("Not signed in".to_string()),
    }
}

pub async fn history(config: &StorefrontConfig) -> Result<String> {
    let mut shop = connect(config)?;
    if shop.start().await.is_none() {
        return Err(explain(OrderFlowError::Unauthenticated));
    }
    shop.realtime().disconnect();
    Ok(format_orders(&shop.orders().await))
}

pub async fn order(config: &StorefrontConfig, items: Vec<ItemSpec>, watch: bool) -> Result<String> {
    let mut shop = connect(config)?;
    shop.start().await;
    if shop.catalog().is_empty() {
        return Err(anyhow!("The menu could not be loaded, so nothing can be ordered"));
    }
    for spec in &items {
        let line = spec.to_cart_item(shop.catalog())?;
        shop.cart_mut().add(line);
    }
    println!("{}", format_cart(shop.cart())?);
    let pb = spinner("Placing your order...");
    let placed = shop.place_order().await;
    pb.finish_and_clear();
    let order = placed.map_err(explain)?.ok_or_else(|| anyhow!("There was nothing to order"))?;
    println!("{}", format_order(&order)?);
    if watch {
        follow(&shop, Some(order.id.clone())).await?;
    } else if shop.pending_simulations() > 0 {
        info!("Exiting before order {} is moved to preparing", order.id);
    }
    Ok(format!("Order {} placed", order.id))
}

pub async fn watch(config: &StorefrontConfig) -> Result<String> {
    let mut shop = connect(config)?;
    if shop.start().await.is_none() {
        return Err(explain(OrderFlowError::Unauthenticated));
    }
    println!("{}", format_orders(&shop.orders().await));
    follow(&shop, None).await?;
    Ok("Stopped watching".to_string())
}

/// Prints connection changes and order notifications until Ctrl-C, or until `until_done` is completed.
async fn follow(shop: &Shop, until_done: Option<OrderId>) -> Result<()> {
    let mut state = shop.realtime().subscribe_state();
    println!("📡 {}. Press Ctrl-C to stop.", *state.borrow());
    let mut poll = tokio::time::interval(ORDER_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let now = *state.borrow_and_update();
                println!("📡 {now}");
                if now == ConnectionState::Closed {
                    warn!("The push channel is closed. Run `sftools history` to check on your orders.");
                    break;
                }
            },
            _ = poll.tick() => {
                if let Some(id) = &until_done {
                    if shop.order(id).await.map(|o| o.status == OrderStatus::Completed).unwrap_or(true) {
                        break;
                    }
                }
            },
        }
    }
    shop.realtime().disconnect();
    Ok(())
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}
