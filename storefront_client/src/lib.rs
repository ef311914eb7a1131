//! HTTP and SignalR adapters for the storefront engine.
//!
//! [`StorefrontHttpApi`] implements [`storefront_engine::StorefrontApi`] against the order service's REST endpoints,
//! and [`SignalRTransport`] implements [`storefront_engine::PushTransport`] against its order hub. Both are configured
//! from a [`StorefrontConfig`], usually built from the environment.
mod api;
mod config;
pub mod error;
pub mod hub;

pub use api::StorefrontHttpApi;
pub use config::{StorefrontConfig, DEFAULT_API_BASE_URL, DEFAULT_HUB_URL, DEFAULT_USER_AGENT};
pub use hub::SignalRTransport;
