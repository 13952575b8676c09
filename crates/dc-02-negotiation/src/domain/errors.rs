//! # Domain Errors
//!
//! Error types for Contract Negotiation.

use super::value_objects::{NegotiationEvent, NegotiationState};
use dc_01_process_store::StoreError;
use shared_types::{MissingIdentifier, PidRole};
use thiserror::Error;

/// Negotiation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// No negotiation matches the given identifier(s).
    #[error("Contract negotiation not found ({0})")]
    NotFound(String),

    /// The pid is already bound to another negotiation.
    #[error("{role} pid '{pid}' is already bound to another negotiation")]
    DuplicatePid { role: PidRole, pid: String },

    /// The current state does not allow the requested transition.
    #[error("Invalid negotiation transition: {from} -> {to}")]
    InvalidTransition {
        from: NegotiationState,
        to: NegotiationState,
    },

    /// The event was delivered on the wrong side's endpoint.
    #[error("Event {event} cannot be received on the {role} endpoint")]
    EventRoleMismatch {
        event: NegotiationEvent,
        role: PidRole,
    },

    /// Caller supplied neither pid.
    #[error(transparent)]
    MissingIdentifier(#[from] MissingIdentifier),

    /// Persistence failure.
    #[error("Negotiation store failure: {0}")]
    Store(#[from] StoreError),
}
