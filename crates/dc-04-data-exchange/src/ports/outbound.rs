//! # Outbound Ports
//!
//! What the orchestrator needs from its host: a client to reach other
//! participants, this connector's own endpoint, and somewhere to report sync
//! outcomes.

use crate::domain::{normalize_endpoint, DataExchangeSnapshot, PeerSyncError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Client for the private exchange API of other participants.
///
/// Production: `HttpPeerSyncClient` (adapters/http_sync_client.rs)
/// Testing: `RecordingSyncClient` (below)
#[async_trait]
pub trait PeerSyncClient: Send + Sync {
    /// Create a mirror of the exchange at `endpoint`; returns the mirror's id.
    async fn create_mirror(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<String, PeerSyncError>;

    /// Overwrite the peer's mirror, authenticated by the exchange key.
    async fn push_update(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<(), PeerSyncError>;
}

/// Resolves this connector's own base URL.
pub trait SelfEndpoint: Send + Sync {
    fn endpoint(&self) -> String;

    /// Whether `endpoint` designates this connector.
    fn is_self(&self, endpoint: &str) -> bool {
        normalize_endpoint(endpoint) == normalize_endpoint(&self.endpoint())
    }
}

/// Self endpoint fixed at startup.
#[derive(Clone, Debug)]
pub struct StaticSelfEndpoint(String);

impl StaticSelfEndpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(normalize_endpoint(&endpoint.into()))
    }
}

impl SelfEndpoint for StaticSelfEndpoint {
    fn endpoint(&self) -> String {
        self.0.clone()
    }
}

/// Result of one push to one peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Delivered,
    Failed,
    /// Retries exhausted; the peer stays out of date.
    Abandoned,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Delivered => "delivered",
            SyncOutcome::Failed => "failed",
            SyncOutcome::Abandoned => "abandoned",
        }
    }
}

/// Receives sync outcomes, e.g. to export metrics.
pub trait SyncObserver: Send + Sync {
    fn sync_attempted(&self, endpoint: &str, outcome: SyncOutcome);
    fn retries_pending(&self, pending: usize);
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSyncObserver;

impl SyncObserver for NoopSyncObserver {
    fn sync_attempted(&self, _endpoint: &str, _outcome: SyncOutcome) {}
    fn retries_pending(&self, _pending: usize) {}
}

// =============================================================================
// Test double
// =============================================================================

/// A call seen by [`RecordingSyncClient`].
#[derive(Clone, Debug, PartialEq)]
pub enum SyncCall {
    CreateMirror {
        endpoint: String,
        snapshot: DataExchangeSnapshot,
    },
    PushUpdate {
        endpoint: String,
        snapshot: DataExchangeSnapshot,
    },
}

impl SyncCall {
    pub fn endpoint(&self) -> &str {
        match self {
            SyncCall::CreateMirror { endpoint, .. } | SyncCall::PushUpdate { endpoint, .. } => {
                endpoint
            }
        }
    }
}

/// In-memory client recording every call. Endpoints marked unreachable fail.
#[derive(Default)]
pub struct RecordingSyncClient {
    calls: Mutex<Vec<SyncCall>>,
    unreachable: Mutex<HashSet<String>>,
    next_mirror: AtomicU64,
}

impl RecordingSyncClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, endpoint: &str, unreachable: bool) {
        let endpoint = normalize_endpoint(endpoint);
        let mut set = self.unreachable.lock();
        if unreachable {
            set.insert(endpoint);
        } else {
            set.remove(&endpoint);
        }
    }

    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.lock().clone()
    }

    /// Endpoints that received a push, in call order.
    pub fn pushed_endpoints(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, SyncCall::PushUpdate { .. }))
            .map(|c| c.endpoint().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn reachable(&self, endpoint: &str) -> Result<(), PeerSyncError> {
        if self.unreachable.lock().contains(&normalize_endpoint(endpoint)) {
            Err(PeerSyncError::Transport(format!("{} unreachable", endpoint)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PeerSyncClient for RecordingSyncClient {
    async fn create_mirror(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<String, PeerSyncError> {
        self.calls.lock().push(SyncCall::CreateMirror {
            endpoint: endpoint.to_string(),
            snapshot: snapshot.clone(),
        });
        self.reachable(endpoint)?;
        Ok(format!(
            "mirror-{}",
            self.next_mirror.fetch_add(1, Ordering::SeqCst)
        ))
    }

    async fn push_update(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<(), PeerSyncError> {
        self.calls.lock().push(SyncCall::PushUpdate {
            endpoint: endpoint.to_string(),
            snapshot: snapshot.clone(),
        });
        self.reachable(endpoint)
    }
}
