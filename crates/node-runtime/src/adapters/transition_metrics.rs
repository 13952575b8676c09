//! Transition observer counting applied state changes in Prometheus.

use connector_telemetry::metrics::record_transition;
use shared_types::{ProcessKind, TransitionObserver};

#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusTransitionObserver;

impl TransitionObserver for PrometheusTransitionObserver {
    fn entered(&self, process: ProcessKind, state: &str) {
        record_transition(process.as_str(), state);
    }
}
