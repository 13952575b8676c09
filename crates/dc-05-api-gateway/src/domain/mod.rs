//! Domain types for the API Gateway.

pub mod config;
pub mod error;
pub mod messages;

pub use config::{ConfigError, GatewayConfig, HttpConfig};
pub use error::{ApiError, GatewayError};
