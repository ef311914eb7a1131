//! Client-driven status progression for newly placed orders.
//!
//! The kitchen does not report when it starts on an order, so the client moves each new order from `pending` to
//! `preparing` itself after a short delay and tells the server. Each scheduled transition remembers only the order id;
//! when it fires, it goes through the order book's regression guard, so an order that has already moved on (or has
//! disappeared, e.g. after a sign-out) is left alone.
use std::{sync::Arc, time::Duration};

use log::*;
use tokio::task::JoinHandle;

use crate::{
    data_types::{OrderId, OrderStatus},
    events::{EventProducers, Notification},
    order_book::SharedOrderBook,
    traits::StorefrontApi,
};

pub struct StatusSimulator<A> {
    api: Arc<A>,
    orders: SharedOrderBook,
    producers: EventProducers,
    delay: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl<A: StorefrontApi> StatusSimulator<A> {
    pub fn new(api: Arc<A>, orders: SharedOrderBook, producers: EventProducers, delay: Duration) -> Self {
        Self { api, orders, producers, delay, tasks: Vec::new() }
    }

    /// Schedules the `pending` → `preparing` transition for `order_id`.
    pub fn schedule(&mut self, order_id: OrderId, token: String) {
        self.tasks.retain(|t| !t.is_finished());
        let api = Arc::clone(&self.api);
        let orders = Arc::clone(&self.orders);
        let producers = self.producers.clone();
        let delay = self.delay;
        debug!("⏱️ Order {order_id} will move to preparing in {}ms", delay.as_millis());
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let target = OrderStatus::Preparing;
            let changed = {
                let mut book = orders.write().await;
                let outcome = book.apply_simulated(&order_id, target);
                outcome.changed().then(|| book.get(&order_id).cloned()).flatten()
            };
            let Some(order) = changed else {
                return;
            };
            producers.publish_notification(Notification::OrderChanged(order)).await;
            match api.update_order_status(&token, &order_id, target).await {
                Ok(()) => debug!("⏱️ Server told that order {order_id} is {target}"),
                Err(e) => warn!("⏱️ Could not tell the server that order {order_id} is {target}. {e}"),
            }
        });
        self.tasks.push(task);
    }

    /// The number of transitions that have not fired yet.
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Abandons every transition that has not fired yet.
    pub fn cancel_all(&mut self) {
        let count = self.tasks.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if count > 0 {
            debug!("⏱️ Cancelled {count} scheduled status transitions");
        }
    }
}

impl<A> Drop for StatusSimulator<A> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
