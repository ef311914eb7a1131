//! Test doubles and fixtures for the storefront engine.
pub mod fake_transport;
pub mod fixtures;
pub mod mocks;
