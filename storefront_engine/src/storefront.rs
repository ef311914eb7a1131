use std::{fmt::Debug, future::Future, pin::Pin, sync::Arc};

use log::*;
use sf_common::helpers::token_prefix;

use crate::{
    cart::CartStore,
    catalog::{load_catalog, Catalog},
    config::EngineConfig,
    data_types::{Identity, Order, OrderId},
    errors::OrderFlowError,
    events::{EventProducers, Notification, OrderEvent, OrderEventKind},
    order_book::{OrderBook, SharedOrderBook},
    order_objects::{Credentials, NewAccount, NewOrderRequest},
    realtime::{ConnectionState, OrderListener, RealtimeSync},
    session::SessionHolder,
    simulation::StatusSimulator,
    traits::{PushTransport, SessionStore, StorefrontApi},
};

/// `Storefront` is the primary API of the engine. It owns the cart, the catalog, the customer's session and their
/// orders, and keeps the orders in step with the server through the order service and the realtime push channel.
///
/// Every order that reaches the storefront, whichever route it takes, goes through the [`OrderBook`] merge rule.
pub struct Storefront<A, S, T> {
    api: Arc<A>,
    session: SessionHolder<S>,
    cart: CartStore,
    catalog: Catalog,
    orders: SharedOrderBook,
    realtime: RealtimeSync<T>,
    simulator: StatusSimulator<A>,
    producers: EventProducers,
    config: EngineConfig,
}

impl<A, S, T> Debug for Storefront<A, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Storefront")
    }
}

impl<A, S, T> Storefront<A, S, T>
where
    A: StorefrontApi,
    S: SessionStore,
    T: PushTransport,
{
    pub fn new(api: A, store: S, transport: T, config: EngineConfig, producers: EventProducers) -> Self {
        Self::with_realtime(api, store, RealtimeSync::new(transport), config, producers)
    }

    /// Like [`Storefront::new`], but with a preconfigured realtime synchronizer.
    pub fn with_realtime(
        api: A,
        store: S,
        realtime: RealtimeSync<T>,
        config: EngineConfig,
        producers: EventProducers,
    ) -> Self {
        let api = Arc::new(api);
        let orders = OrderBook::shared();
        let merger = merge_listener(Arc::clone(&orders), producers.clone());
        realtime.add_listener(OrderEventKind::NewOrder, Arc::clone(&merger));
        realtime.add_listener(OrderEventKind::OrderUpdated, merger);
        let simulator =
            StatusSimulator::new(Arc::clone(&api), Arc::clone(&orders), producers.clone(), config.simulation_delay);
        Self {
            api,
            session: SessionHolder::new(store),
            cart: CartStore::new(),
            catalog: Catalog::default(),
            orders,
            realtime,
            simulator,
            producers,
            config,
        }
    }

    /// Brings the storefront up: loads the menu and, if a session was saved by a previous run, restores it, fetches
    /// the order history and opens the push channel.
    ///
    /// Nothing here fails. Problems are logged (and where appropriate, reported as notifications) and the storefront
    /// carries on with whatever it has.
    pub async fn start(&mut self) -> Option<&Identity> {
        self.reload_catalog().await;
        if self.session.restore().is_some() {
            self.on_signed_in().await;
        }
        self.session.identity()
    }

    //------------------------------------------    Catalog    ------------------------------------------------------

    pub async fn reload_catalog(&mut self) -> &Catalog {
        self.catalog = load_catalog(self.api.as_ref()).await;
        &self.catalog
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    //------------------------------------------     Cart      ------------------------------------------------------

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    //------------------------------------------    Session    ------------------------------------------------------

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    /// Creates an account and signs straight into it.
    pub async fn register(&mut self, account: NewAccount) -> Result<&Identity, OrderFlowError> {
        self.api.register(&account).await.map_err(|e| {
            warn!("🔑️ Registration for {} failed. {e}", account.email);
            e
        })?;
        info!("🔑️ Registered a new account for {}", account.email);
        let fallback_name = account.name.clone();
        self.sign_in(account.credentials(), Some(fallback_name)).await
    }

    /// Signs in, then fetches the customer's order history and opens the push channel.
    ///
    /// If the session cannot be saved the customer is still signed in for this run, but an error is returned.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&Identity, OrderFlowError> {
        let credentials = Credentials { email: email.to_string(), password: password.to_string() };
        self.sign_in(credentials, None).await
    }

    async fn sign_in(
        &mut self,
        credentials: Credentials,
        fallback_name: Option<String>,
    ) -> Result<&Identity, OrderFlowError> {
        let result = self.api.login(&credentials).await.map_err(|e| {
            warn!("🔑️ Sign-in for {} failed. {e}", credentials.email);
            e
        })?;
        let name = result
            .full_name
            .filter(|n| !n.trim().is_empty())
            .or(fallback_name)
            .unwrap_or_else(|| credentials.email.split('@').next().unwrap_or_default().to_string());
        let identity = Identity::new(result.token, name, credentials.email);
        let saved = self.session.set(identity);
        self.on_signed_in().await;
        if let Err(e) = saved {
            warn!("🔑️ The session could not be saved and will not survive a restart. {e}");
            return Err(e.into());
        }
        self.session.identity().ok_or(OrderFlowError::Unauthenticated)
    }

    async fn on_signed_in(&mut self) {
        if let Err(e) = self.refresh_history().await {
            warn!("📦️ Could not fetch the order history. {e}");
        }
        let Some(token) = self.session.token().map(String::from) else {
            return;
        };
        if let Err(e) = self.realtime.connect(&token).await {
            debug!("📡️ Continuing without live order updates. {e}");
        }
    }

    /// Signs out: the push channel is closed, pending simulated transitions are abandoned, and the identity and the
    /// orders are forgotten. The cart is kept.
    pub async fn logout(&mut self) {
        self.realtime.disconnect();
        self.simulator.cancel_all();
        if let Err(e) = self.session.clear() {
            warn!("🔑️ Could not remove the saved session. {e}");
        }
        self.orders.write().await.clear();
        info!("🔑️ Signed out");
    }

    //------------------------------------------    Orders     ------------------------------------------------------

    /// Submits the cart as a new pickup order.
    ///
    /// Returns `Ok(None)` if the cart is empty. If nobody is signed in, nothing is sent, the cart is left as it is and
    /// an [`Notification::AuthenticationRequired`] notification is raised. If the server accepts the order, the cart
    /// is cleared and the order, exactly as the server returned it, goes to the head of the order list. If it does not,
    /// the cart is kept and an [`Notification::OrderFailed`] notification is raised.
    pub async fn place_order(&mut self) -> Result<Option<Order>, OrderFlowError> {
        if self.cart.is_empty() {
            debug!("🛒️ Nothing to order. The cart is empty");
            return Ok(None);
        }
        let Some(token) = self.session.token().map(String::from) else {
            info!("🛒️ An order was attempted without signing in");
            self.producers.publish_notification(Notification::AuthenticationRequired).await;
            return Err(OrderFlowError::Unauthenticated);
        };
        let request = NewOrderRequest::from_cart(self.cart.items());
        debug!("🛒️ Submitting an order of {} lines with {}", request.items.len(), token_prefix(&token));
        match self.api.create_order(&token, &request).await {
            Ok(order) => {
                info!("📦️ Order {} accepted. Total {}", order.id, order.total_amount);
                self.cart.clear();
                self.orders.write().await.merge(order.clone());
                if self.config.simulate_status {
                    self.simulator.schedule(order.id.clone(), token);
                }
                self.producers.publish_notification(Notification::OrderPlaced(order.clone())).await;
                Ok(Some(order))
            },
            Err(e) => {
                error!("📦️ Order submission failed. {e}");
                self.producers.publish_notification(Notification::OrderFailed(e.user_message())).await;
                Err(e.into())
            },
        }
    }

    /// Replaces the local orders with the server's order history. Returns the number of orders now held.
    pub async fn refresh_history(&mut self) -> Result<usize, OrderFlowError> {
        let Some(token) = self.session.token().map(String::from) else {
            return Err(OrderFlowError::Unauthenticated);
        };
        match self.api.order_history(&token).await {
            Ok(history) => {
                let mut book = self.orders.write().await;
                book.replace_all(history);
                info!("📦️ Fetched {} orders", book.len());
                Ok(book.len())
            },
            Err(e) => {
                self.producers.publish_notification(Notification::HistoryFailed(e.user_message())).await;
                Err(e.into())
            },
        }
    }

    /// A snapshot of the customer's orders, most recent first.
    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.orders().to_vec()
    }

    pub async fn order(&self, id: &OrderId) -> Option<Order> {
        self.orders.read().await.get(id).cloned()
    }

    pub fn order_book(&self) -> SharedOrderBook {
        Arc::clone(&self.orders)
    }

    pub fn pending_simulations(&self) -> usize {
        self.simulator.pending()
    }

    //------------------------------------------   Realtime    ------------------------------------------------------

    pub fn realtime(&self) -> &RealtimeSync<T> {
        &self.realtime
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.realtime.state()
    }
}

/// Feeds push events into the order book, and announces the ones that changed something.
fn merge_listener(orders: SharedOrderBook, producers: EventProducers) -> OrderListener {
    Arc::new(move |event: OrderEvent| {
        let orders = Arc::clone(&orders);
        let producers = producers.clone();
        Box::pin(async move {
            let outcome = orders.write().await.merge(event.order.clone());
            trace!("📡️ {} event for order {}: {outcome:?}", event.kind, event.order.id);
            if outcome.changed() {
                producers.publish_notification(Notification::OrderChanged(event.order)).await;
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}
