//! Storefront Engine
//!
//! The storefront engine is the order lifecycle core of a food-ordering storefront client. Customers browse a menu,
//! build a cart, sign in, place pickup orders and follow their orders through `pending`, `preparing`, `ready` and
//! `completed` in near real time.
//!
//! The engine is provider-agnostic. It talks to the outside world only through the traits in [`mod@traits`]:
//! 1. [`StorefrontApi`], the request/response order service.
//! 2. [`PushTransport`], the realtime channel over which the server announces new and changed orders.
//! 3. [`SessionStore`], where the signed-in identity is kept between runs.
//!
//! [`Storefront`] owns every component and wires them together. Orders can reach it from the submission response, the
//! push channel, the history endpoint and the client's own simulated status progression, in any order; the
//! [`OrderBook`] merge rule reconciles them so that stale updates never overwrite newer state.
//!
//! The engine also emits user-facing [`events::Notification`]s. Register hooks with [`events::EventHooks`] to show
//! them to the customer.
pub mod cart;
pub mod catalog;
pub mod config;
pub mod data_types;
pub mod errors;
pub mod events;
pub mod normalize;
pub mod order_book;
pub mod order_objects;
pub mod realtime;
pub mod session;
mod simulation;
mod storefront;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use cart::{CartItemUpdate, CartStore, TAX_RATE};
pub use catalog::{load_catalog, Catalog, ALL_CATEGORIES};
pub use config::EngineConfig;
pub use data_types::{Identity, MenuItem, Order, OrderId, OrderStatus};
pub use errors::OrderFlowError;
pub use order_book::{MergeOutcome, OrderBook, SharedOrderBook};
pub use realtime::{ConnectionState, RealtimeSync};
pub use session::SessionHolder;
pub use simulation::StatusSimulator;
pub use storefront::Storefront;
pub use traits::{ApiError, PushTransport, SessionStore, StorefrontApi};
