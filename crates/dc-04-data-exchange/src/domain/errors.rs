//! # Domain Errors

use dc_01_process_store::StoreError;
use thiserror::Error;

/// Why an exchange-key check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyRejection {
    #[error("Missing exchange key")]
    Missing,
    #[error("Wrong exchange key given")]
    Wrong,
}

/// Failure of a single call to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerSyncError {
    #[error("peer did not answer within {0} ms")]
    Timeout(u64),
    #[error("peer answered with status {0}")]
    Rejected(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed peer response: {0}")]
    Malformed(String),
}

/// Data exchange error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("Data exchange not found: {0}")]
    NotFound(String),

    #[error("Service '{service}' not found in the service chain")]
    StepNotFound { service: String },

    #[error("Invalid data exchange: {0}")]
    Validation(String),

    #[error(transparent)]
    Unauthorized(#[from] KeyRejection),

    /// A remote mirror could not be created.
    #[error("Mirror creation at {endpoint} failed: {source}")]
    MirrorFailed {
        endpoint: String,
        source: PeerSyncError,
    },

    /// The local change was committed but some peers did not accept it.
    /// They are being retried in the background.
    #[error("Exchange {exchange_id} committed, sync pending for {}", .endpoints.join(", "))]
    SyncFailed {
        exchange_id: String,
        endpoints: Vec<String>,
    },

    #[error("Exchange store failure: {0}")]
    Store(#[from] StoreError),
}
