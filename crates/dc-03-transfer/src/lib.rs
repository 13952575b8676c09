//! # DC-03 Transfer Process
//!
//! State machine of the transfer process protocol.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ```text
//! REQUESTED -> STARTED <-> SUSPENDED -> COMPLETED
//!         any state --------------------> TERMINATED
//! ```
//!
//! A start message on a SUSPENDED transfer does not resume it.

#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{TransferError, TransferProcess, TransferProcessMessage, TransferState};
pub use ports::{TransferApi, TransferRequest};
pub use service::{TransferDependencies, TransferService};
