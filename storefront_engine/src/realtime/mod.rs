//! # Realtime order synchronization
//!
//! The server announces new orders and order status changes over a long-lived push channel. [`RealtimeSync`] owns
//! that channel for one signed-in customer: it opens the connection through a [`crate::traits::PushTransport`],
//! reconnects with backoff when the connection drops, normalizes every inbound event into an [`crate::Order`] and
//! hands it to the registered listeners.
//!
//! Events that arrive while the connection is down are lost; the channel makes no attempt to backfill them. A full
//! history fetch is the resynchronization point.
mod listeners;
mod sync;

pub use listeners::{ListenerId, ListenerRegistry, OrderListener};
pub use sync::{ConnectionState, RealtimeSync, DEFAULT_RECONNECT_DELAYS};
