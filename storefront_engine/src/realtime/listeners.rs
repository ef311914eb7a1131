use std::sync::{
    atomic::{AtomicU64, Ordering},
    PoisonError,
    RwLock,
};

use log::*;

use crate::events::{Handler, OrderEvent, OrderEventKind};

pub type OrderListener = Handler<OrderEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    kind: OrderEventKind,
    listener: OrderListener,
}

/// The set of listeners interested in order events. Any number of listeners may register for the same kind of event;
/// each one receives every event of that kind.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: OrderEventKind, listener: OrderListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let mut registrations = self.registrations.write().unwrap_or_else(PoisonError::into_inner);
        registrations.push(Registration { id, kind, listener });
        trace!("📡️ Listener {id:?} registered for {kind}");
        id
    }

    /// Removes a single listener. Other listeners, including ones for the same event kind, are unaffected.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.write().unwrap_or_else(PoisonError::into_inner);
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        before != registrations.len()
    }

    pub fn count(&self, kind: OrderEventKind) -> usize {
        let registrations = self.registrations.read().unwrap_or_else(PoisonError::into_inner);
        registrations.iter().filter(|r| r.kind == kind).count()
    }

    /// Delivers the event to every listener registered for its kind, one after the other, in registration order.
    /// Returns the number of listeners that received it.
    pub async fn dispatch(&self, event: OrderEvent) -> usize {
        let listeners = {
            let registrations = self.registrations.read().unwrap_or_else(PoisonError::into_inner);
            registrations.iter().filter(|r| r.kind == event.kind).map(|r| r.listener.clone()).collect::<Vec<_>>()
        };
        if listeners.is_empty() {
            trace!("📡️ No listeners for {} event on order {}", event.kind, event.order.id);
        }
        for listener in &listeners {
            (listener)(event.clone()).await;
        }
        listeners.len()
    }
}
