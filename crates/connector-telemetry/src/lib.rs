//! # Connector Telemetry
//!
//! Logging and metrics for the dataspace connector.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use connector_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DC_SERVICE_NAME` | `dataspace-connector` | Service name in logs |
//! | `DC_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `DC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `DC_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install the tracing subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
