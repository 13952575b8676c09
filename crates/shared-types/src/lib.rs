//! # Shared Types Crate
//!
//! Vocabulary shared by the negotiation, transfer and data-exchange
//! subsystems of the connector.
//!
//! ## Design Principles
//!
//! - **Dual identity**: every protocol process is known by two identifiers,
//!   one minted by the provider and one by the consumer. [`PidLookup`] is the
//!   only way a subsystem asks the store for a process.
//! - **Locally minted ids are recognisable**: [`ids::generate_pid`] prefixes
//!   its output with `urn:uuid:`.
//! - **One writer per identifier**: [`KeyedLocks`] hands out a FIFO critical
//!   section per record key so concurrent messages for the same process are
//!   applied in arrival order.

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod locks;
pub mod lookup;
pub mod observe;

pub use envelope::*;
pub use errors::*;
pub use ids::{generate_pid, PidGenerator, UrnUuidGenerator, PID_PREFIX};
pub use locks::KeyedLocks;
pub use lookup::{PidLookup, PidRole};
pub use observe::{NoopTransitionObserver, RecordingTransitionObserver, TransitionObserver};
