use std::fmt::Display;

use crate::data_types::Order;

/// The kinds of order event the push channel delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEventKind {
    NewOrder,
    OrderUpdated,
}

impl OrderEventKind {
    /// Maps a hub method name to an event kind. Some backends use `ReceiveOrderUpdated` for updates.
    pub fn from_target(target: &str) -> Option<Self> {
        match target {
            "NewOrder" => Some(Self::NewOrder),
            "OrderUpdated" | "ReceiveOrderUpdated" => Some(Self::OrderUpdated),
            _ => None,
        }
    }
}

impl Display for OrderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventKind::NewOrder => write!(f, "NewOrder"),
            OrderEventKind::OrderUpdated => write!(f, "OrderUpdated"),
        }
    }
}

/// A normalized order event from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order: Order,
}

/// Something the customer should be told about. Notifications never block the operation that raised them.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An action needs a signed-in customer, and there is none.
    AuthenticationRequired,
    /// The server accepted a new order.
    OrderPlaced(Order),
    /// An order could not be placed. The message is fit to show to the customer.
    OrderFailed(String),
    HistoryFailed(String),
    /// A known order changed as a result of a server update.
    OrderChanged(Order),
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::AuthenticationRequired => write!(f, "Please sign in to continue."),
            Notification::OrderPlaced(o) => write!(f, "Order {} placed. Total {}.", o.id, o.total_amount),
            Notification::OrderFailed(msg) => write!(f, "Failed to place order. {msg}"),
            Notification::HistoryFailed(msg) => write!(f, "Error fetching orders: {msg}"),
            Notification::OrderChanged(o) => write!(f, "Order {} is now {}.", o.id, o.status.label()),
        }
    }
}
