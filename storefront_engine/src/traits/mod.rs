//! # Storefront backends
//!
//! This module defines the interface contracts between the order lifecycle engine and the outside world. The engine
//! never talks to the network or the filesystem directly; instead it is generic over these traits.
//!
//! * [`StorefrontApi`] is the request/response order service: menu, authentication, order creation, order history and
//!   status updates.
//! * [`PushTransport`] opens the realtime push channel over which the server announces new and updated orders.
//! * [`SessionStore`] is the small key-value store used to persist the signed-in identity between runs.
mod push_transport;
mod session_store;
mod storefront_api;

pub use push_transport::{HubMessage, HubStream, PushError, PushTransport};
pub use session_store::{MemorySessionStore, SessionError, SessionStore};
pub use storefront_api::{ApiError, StorefrontApi};
