//! # DC-04 Data Exchange
//!
//! Orchestrates a data exchange across a chain of participants that share no
//! database.
//!
//! **Subsystem ID:** 04
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Mirrors
//!
//! Every participant keeps its own copy of the exchange. The copies are
//! linked by `exchangeIdentifier` and guarded by `exchangeKey`: a peer may
//! overwrite our copy only by presenting the key. `providerDataExchange` and
//! `consumerDataExchange` carry the id of each side's copy.
//!
//! ## Propagation
//!
//! ```text
//! local change ──► save ──► SyncDispatcher ──► PUT peer/…/exchangeidentifier/{id}
//!                               │  (semaphore, timeout)
//!                               └─ failed ──► background retry, backoff + jitter
//! ```
//!
//! With a service chain, every distinct connector in the chain other than this
//! one receives the update. Without one, the single neighbor does.
//!
//! ## Module Structure
//!
//! ```text
//! dc-04-data-exchange/
//! ├── domain/     # DataExchange, ServiceChain, errors
//! ├── ports/      # DataExchangeApi, PeerSyncClient, SelfEndpoint, SyncObserver
//! ├── adapters/   # HttpPeerSyncClient, SyncDispatcher
//! └── service.rs  # DataExchangeService
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{HttpPeerSyncClient, SyncConfig, SyncDispatcher, SyncReport, EXCHANGE_KEY_HEADER};
pub use domain::{
    normalize_endpoint, status, ChainStep, DataExchange, DataExchangeSnapshot, ExchangeError,
    ExchangeResource, KeyRejection, NewDataExchange, PeerSyncError, ServiceChain, StepPath,
};
pub use ports::{
    DataExchangeApi, NoopSyncObserver, PeerSyncClient, RecordingSyncClient, SelfEndpoint,
    StaticSelfEndpoint, SyncCall, SyncObserver, SyncOutcome,
};
pub use service::{keys_match, DataExchangeService, ExchangeDependencies};
