//! # Dataspace Connector Test Suite
//!
//! Cross-subsystem tests that run complete connectors over real TCP.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # TestConnector: one connector on an ephemeral port
//! └── integration/      # Protocol and multi-connector flows
//!     ├── contract_lifecycle.rs
//!     └── exchange_sync.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dc-tests
//! cargo test -p dc-tests integration::exchange_sync
//! ```

pub mod harness;
pub mod integration;

pub use harness::{TestConnector, DATASPACE_TOKEN};
