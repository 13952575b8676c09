//! # DC-02 Contract Negotiation
//!
//! State machine of the contract negotiation protocol.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## States
//!
//! ```text
//! REQUESTED -> OFFERED -> ACCEPTED -> AGREED -> VERIFIED -> FINALIZED
//!      \__________\___________\__________\_________\----> TERMINATED
//! ```
//!
//! Non-terminal states accept any incoming message, since peers may skip
//! steps. FINALIZED only terminates; TERMINATED is absorbing.
//!
//! ## Identity
//!
//! The provider and the consumer each mint their own pid for the same
//! negotiation. Messages addressed by path carry the counterpart pid in the
//! body, and both must match the stored pair.
//!
//! ## Module Structure
//!
//! ```text
//! dc-02-negotiation/
//! ├── domain/     # ContractNegotiation, NegotiationState, events, errors
//! ├── ports/      # NegotiationApi
//! └── service.rs  # NegotiationService
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    ContractNegotiation, ContractNegotiationMessage, NegotiationError, NegotiationEvent,
    NegotiationState, TerminationDetail,
};
pub use ports::{NegotiationApi, NegotiationOffer, NegotiationRequest};
pub use service::{NegotiationDependencies, NegotiationService};
