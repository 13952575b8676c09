//! Sync observer exporting outcomes to Prometheus.

use connector_telemetry::metrics::{record_sync, set_retries_pending};
use dc_04_data_exchange::{SyncObserver, SyncOutcome};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusSyncObserver;

impl SyncObserver for PrometheusSyncObserver {
    fn sync_attempted(&self, endpoint: &str, outcome: SyncOutcome) {
        debug!(endpoint = %endpoint, outcome = outcome.as_str(), "[node] Sync attempt");
        record_sync(outcome.as_str());
    }

    fn retries_pending(&self, pending: usize) {
        set_retries_pending(pending);
    }
}
