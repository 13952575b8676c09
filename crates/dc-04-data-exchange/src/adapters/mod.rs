//! # Adapters Layer
//!
//! - `http_sync_client`: reqwest implementation of `PeerSyncClient`
//! - `sync_dispatcher`: concurrent push with background retry

pub mod http_sync_client;
pub mod sync_dispatcher;

pub use http_sync_client::{HttpPeerSyncClient, EXCHANGE_KEY_HEADER};
pub use sync_dispatcher::{SyncConfig, SyncDispatcher, SyncReport};
