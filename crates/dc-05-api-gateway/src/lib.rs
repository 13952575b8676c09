//! # DC-05 API Gateway
//!
//! HTTP boundary of the connector.
//!
//! **Subsystem ID:** 05
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    API GATEWAY (dc-05)                        │
//! │                                                              │
//! │  TraceLayer → Timeout → Body limit                           │
//! │       │                                                      │
//! │       ├── /negotiations, /callback/negotiations ──► dc-02    │
//! │       ├── /transfers, /callback/transfers ────────► dc-03    │
//! │       ├── /private/dataexchanges (bearer) ────────► dc-04    │
//! │       ├── /private/.../exchangeidentifier (key) ──► dc-04    │
//! │       └── /health, /metrics                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Protocol messages are checked for `@context`, `@type` and their required
//! fields before they reach a subsystem. Every failure leaves as
//! `{"code", "message"}`, validation failures with the offending body under
//! `payload`.

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod routes;
pub mod service;

pub use domain::{ApiError, ConfigError, GatewayConfig, GatewayError, HttpConfig};
pub use routes::AppState;
pub use service::ApiGatewayService;
