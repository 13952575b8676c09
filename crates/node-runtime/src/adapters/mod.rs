//! # Runtime Adapters
//!
//! Host-side implementations of subsystem ports.
//!
//! - `storage` - key-value backends for the process store
//! - `sync_metrics` - sync outcomes to Prometheus
//! - `transition_metrics` - applied protocol transitions to Prometheus

pub mod storage;
pub mod sync_metrics;
pub mod transition_metrics;

pub use storage::open_store;
pub use sync_metrics::PrometheusSyncObserver;
pub use transition_metrics::PrometheusTransitionObserver;
