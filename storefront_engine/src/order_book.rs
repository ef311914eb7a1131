//! The local collection of orders and the rules for merging updates into it.
//!
//! Orders reach the client from four places: the response to an order submission, realtime push events, the order
//! history endpoint and the simulated status progression the client runs for itself. These can arrive in any order.
//! The [`OrderBook`] reconciles them:
//!
//! * An order with an id that is not yet known is inserted at the head of the collection.
//! * An authoritative update (anything from the server) for a known id replaces the whole local record, unless it is
//!   older than what we already hold (its `updatedAt` is strictly earlier), in which case it is dropped.
//! * An update that would move the status backwards is only applied if its `updatedAt` was sent by the server and is
//!   strictly later than the local one. An equal timestamp, or one filled in on receipt, leaves the status alone.
//! * A simulated transition only ever moves an order *forward*. If the order has already reached (or passed) the
//!   target status, the transition is dropped. Simulated transitions never touch `updatedAt`, which always comes from
//!   the server.
//! * A history fetch replaces the collection wholesale.
//!
//! The collection is kept most-recent-first and never holds two orders with the same id.
use std::sync::Arc;

use log::*;
use tokio::sync::RwLock;

use crate::data_types::{Order, OrderId, OrderStatus};

pub type SharedOrderBook = Arc<RwLock<OrderBook>>;

/// What happened when an update was offered to the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The order was not known, and has been added at the head of the collection.
    Inserted,
    /// The local record was replaced (or, for simulated transitions, advanced).
    Replaced,
    /// The update was older than the local record and was dropped.
    Stale,
    /// The update referred to an order that is not in the collection, and was dropped.
    Ignored,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, MergeOutcome::Inserted | MergeOutcome::Replaced)
    }
}

#[derive(Debug, Default, Clone)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedOrderBook {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Merges an authoritative copy of an order into the collection.
    pub fn merge(&mut self, incoming: Order) -> MergeOutcome {
        match self.orders.iter_mut().find(|o| o.id == incoming.id) {
            None => {
                debug!("📦️ New order {} ({})", incoming.id, incoming.status);
                self.orders.insert(0, incoming);
                MergeOutcome::Inserted
            },
            Some(existing) if incoming.updated_at < existing.updated_at => {
                debug!(
                    "📦️ Dropping stale update for order {}. Local copy is from {}, update is from {}",
                    incoming.id, existing.updated_at, incoming.updated_at
                );
                MergeOutcome::Stale
            },
            Some(existing)
                if incoming.status < existing.status &&
                    (!incoming.updated_at_known || incoming.updated_at <= existing.updated_at) =>
            {
                debug!(
                    "📦️ Order {} is already {}. Update to {} from {} dropped",
                    incoming.id, existing.status, incoming.status, incoming.updated_at
                );
                MergeOutcome::Stale
            },
            Some(existing) => {
                if existing.status != incoming.status {
                    debug!("📦️ Order {} moved from {} to {}", incoming.id, existing.status, incoming.status);
                }
                *existing = incoming;
                MergeOutcome::Replaced
            },
        }
    }

    /// Applies a locally simulated status transition, but only if the order exists and has not yet reached `status`.
    pub fn apply_simulated(&mut self, id: &OrderId, status: OrderStatus) -> MergeOutcome {
        let Some(order) = self.orders.iter_mut().find(|o| &o.id == id) else {
            trace!("📦️ Simulated transition to {status} for unknown order {id} ignored");
            return MergeOutcome::Ignored;
        };
        if order.status >= status {
            debug!("📦️ Order {id} is already {}. Simulated transition to {status} dropped", order.status);
            return MergeOutcome::Stale;
        }
        debug!("📦️ Order {id} moved from {} to {status} (simulated)", order.status);
        order.status = status;
        MergeOutcome::Replaced
    }

    /// Replaces the entire collection with the given orders, most recently created first.
    ///
    /// If the list contains the same id more than once, the most recently updated copy is kept.
    pub fn replace_all(&mut self, orders: Vec<Order>) {
        let mut result: Vec<Order> = Vec::with_capacity(orders.len());
        for order in orders {
            match result.iter_mut().find(|o| o.id == order.id) {
                Some(existing) if order.updated_at > existing.updated_at => *existing = order,
                Some(_) => trace!("📦️ Duplicate order {} in history ignored", order.id),
                None => result.push(order),
            }
        }
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("📦️ Order collection replaced with {} orders", result.len());
        self.orders = result;
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
