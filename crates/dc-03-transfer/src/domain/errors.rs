//! # Domain Errors

use super::value_objects::TransferState;
use dc_01_process_store::StoreError;
use shared_types::{MissingIdentifier, PidRole};
use thiserror::Error;

/// Transfer error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// No transfer process matches the given identifier.
    #[error("Transfer process not found ({0})")]
    NotFound(String),

    /// The pid is already bound to another transfer process.
    #[error("{role} pid '{pid}' is already bound to another transfer process")]
    DuplicatePid { role: PidRole, pid: String },

    /// The current state does not allow the requested transition.
    #[error("Invalid transfer transition: {from} -> {to}")]
    InvalidTransition {
        from: TransferState,
        to: TransferState,
    },

    /// Caller supplied neither pid.
    #[error(transparent)]
    MissingIdentifier(#[from] MissingIdentifier),

    /// Persistence failure.
    #[error("Transfer store failure: {0}")]
    Store(#[from] StoreError),
}
