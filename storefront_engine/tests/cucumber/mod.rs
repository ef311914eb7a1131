mod kitchen;
mod setup;
mod steps;
mod world;

pub use world::StorefrontWorld;
