//! Prometheus metrics for the connector.
//!
//! All metrics follow the naming convention: `dc_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Connector metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PROTOCOL METRICS (Subsystems 2, 3)
    // =========================================================================

    /// State transitions applied, by process kind and target state
    pub static ref STATE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("dc_process_transitions_total", "Protocol state transitions applied"),
        &["process", "state"]  // process: negotiation/transfer
    ).expect("metric creation failed");

    // =========================================================================
    // EXCHANGE SYNC METRICS (Subsystem 4)
    // =========================================================================

    /// Pushes to peers, by outcome
    pub static ref SYNC_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("dc_exchange_sync_attempts_total", "Exchange pushes to peers"),
        &["outcome"]  // outcome: delivered/failed/abandoned
    ).expect("metric creation failed");

    /// Background retries still running
    pub static ref SYNC_RETRIES_PENDING: Gauge = Gauge::new(
        "dc_exchange_sync_retries_pending",
        "Peers waiting for a background sync retry"
    ).expect("metric creation failed");

    // =========================================================================
    // HTTP METRICS (Subsystem 5)
    // =========================================================================

    /// Error responses by status code
    pub static ref API_ERRORS: CounterVec = CounterVec::new(
        Opts::new("dc_api_errors_total", "Error responses by status code"),
        &["status"]
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(STATE_TRANSITIONS.clone()),
        Box::new(SYNC_ATTEMPTS.clone()),
        Box::new(SYNC_RETRIES_PENDING.clone()),
        Box::new(API_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

pub fn record_transition(process: &str, state: &str) {
    STATE_TRANSITIONS.with_label_values(&[process, state]).inc();
}

pub fn record_sync(outcome: &str) {
    SYNC_ATTEMPTS.with_label_values(&[outcome]).inc();
}

pub fn set_retries_pending(pending: usize) {
    SYNC_RETRIES_PENDING.set(pending as f64);
}

pub fn record_api_error(status: u16) {
    API_ERRORS.with_label_values(&[&status.to_string()]).inc();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
