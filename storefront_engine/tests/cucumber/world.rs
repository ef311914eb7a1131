use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
};

use cucumber::World;
use log::*;
use storefront_engine::{
    events::{EventHandlers, EventHooks, Notification},
    traits::{MemorySessionStore, SessionError},
    EngineConfig,
    OrderFlowError,
    SessionStore,
    Storefront,
};

use crate::cucumber::kitchen::{Kitchen, KitchenApi, KitchenHub};

pub type TestStorefront = Storefront<KitchenApi, SharedSessionStore, KitchenHub>;

/// A session store that outlives the storefront, so that scenarios can restart the client.
#[derive(Debug, Clone, Default)]
pub struct SharedSessionStore(Arc<MemorySessionStore>);

impl SessionStore for SharedSessionStore {
    fn read(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.0.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.0.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.0.remove(key)
    }
}

#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct StorefrontWorld {
    pub kitchen: Kitchen,
    pub store: SharedSessionStore,
    pub config: EngineConfig,
    pub storefront: Option<TestStorefront>,
    pub notifications: Arc<Mutex<Vec<Notification>>>,
    pub last_error: Option<OrderFlowError>,
}

impl StorefrontWorld {
    fn new() -> Self {
        Self {
            kitchen: Kitchen::default(),
            store: SharedSessionStore::default(),
            config: EngineConfig::default(),
            storefront: None,
            notifications: Arc::new(Mutex::new(Vec::new())),
            last_error: None,
        }
    }

    pub fn storefront(&mut self) -> &mut TestStorefront {
        self.storefront.as_mut().expect("The storefront has not been started")
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Starts (or restarts) the storefront against the kitchen, keeping whatever session was saved.
    pub async fn start_storefront(&mut self) {
        if self.storefront.take().is_some() {
            debug!("🍔️ Restarting the storefront");
        }
        let mut hooks = EventHooks::default();
        let sink = Arc::clone(&self.notifications);
        hooks.on_notification(move |n| {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                sink.lock().unwrap_or_else(PoisonError::into_inner).push(n);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers();
        let mut storefront =
            Storefront::new(self.kitchen.api(), self.store.clone(), self.kitchen.hub(), self.config, producers);
        storefront.start().await;
        self.storefront = Some(storefront);
    }
}
