pub mod helpers;
mod price;
mod secret;

pub use price::{Price, CURRENCY_SYMBOL};
pub use secret::Secret;
