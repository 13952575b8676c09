//! # Domain Errors
//!
//! Error types for the Process Store subsystem.

use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Errors raised by the process repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend failure.
    #[error(transparent)]
    Backend(#[from] KVStoreError),

    /// A stored record could not be decoded, or a record could not be encoded.
    #[error("Record serialization failed: {0}")]
    Serialization(String),

    /// An index value is already bound to a different record.
    #[error("{index} '{value}' is already bound to record {existing_id}")]
    DuplicateIndex {
        index: &'static str,
        value: String,
        existing_id: String,
    },

    /// A record was saved before being created.
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// An index points at a record that no longer exists.
    #[error("Dangling {index} index for '{value}'")]
    DanglingIndex { index: &'static str, value: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
