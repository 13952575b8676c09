//! # Process Store Subsystem
//!
//! Persistence for negotiation, transfer and data-exchange records.
//!
//! ## Architecture
//!
//! - **Domain**: [`StoredRecord`] / [`ProcessRecord`] traits and [`StoreError`]
//! - **Ports**: [`KeyValueStore`] backend interface
//! - **Service**: [`ProcessRepository`], typed find/create/save over a backend
//!
//! Records are never deleted; the store doubles as the audit trail of every
//! process this connector took part in.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::outbound::{BatchOperation, InMemoryKVStore, KeyValueStore};
pub use service::ProcessRepository;
