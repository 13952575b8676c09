//! Middleware and request guards.

pub mod auth;
pub mod exchange_key;

pub use auth::{constant_time_compare, PrivateAuthLayer};
pub use exchange_key::ExchangeKey;
