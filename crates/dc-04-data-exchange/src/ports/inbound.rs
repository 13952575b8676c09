//! # Inbound Ports
//!
//! API trait defining what the Data Exchange subsystem can do.

use crate::domain::{DataExchange, DataExchangeSnapshot, ExchangeError, NewDataExchange};
use async_trait::async_trait;

/// Data exchange API - inbound port.
///
/// Operations that change shared state commit locally first, then propagate.
/// A propagation failure is reported as [`ExchangeError::SyncFailed`]; the
/// local change stands and the failed peers are retried in the background.
#[async_trait]
pub trait DataExchangeApi: Send + Sync {
    /// Local exchange by record id.
    async fn get(&self, id: &str) -> Result<DataExchange, ExchangeError>;

    /// Local exchange by exchange identifier.
    async fn get_by_identifier(&self, identifier: &str) -> Result<DataExchange, ExchangeError>;

    /// Create an exchange here and a mirror at the counterpart.
    async fn create(&self, new: NewDataExchange) -> Result<DataExchange, ExchangeError>;

    /// Create (or return) the local mirror of a peer's exchange.
    async fn create_mirror(
        &self,
        snapshot: DataExchangeSnapshot,
    ) -> Result<DataExchange, ExchangeError>;

    /// Point a chain step (nested steps included) at an infrastructure
    /// connector, create a mirror there, and sync the neighbor.
    async fn bind_chain_step(
        &self,
        id: &str,
        service: &str,
        endpoint: &str,
    ) -> Result<DataExchange, ExchangeError>;

    /// Set status and payload, then sync every chain endpoint (or the single
    /// neighbor when there is no chain).
    async fn update_status(
        &self,
        id: &str,
        status: &str,
        payload: Option<String>,
    ) -> Result<DataExchange, ExchangeError>;

    /// Mark a top-level chain step completed, then sync like
    /// [`DataExchangeApi::update_status`].
    async fn complete_service_chain_step(
        &self,
        id: &str,
        service: &str,
    ) -> Result<DataExchange, ExchangeError>;

    /// Push the current exchange to one peer.
    async fn sync_with_peer(&self, id: &str, endpoint: &str) -> Result<(), ExchangeError>;

    /// A peer overwrites our mirror. The presented key must be the exchange's.
    async fn apply_remote_update(
        &self,
        identifier: &str,
        presented_key: &str,
        snapshot: DataExchangeSnapshot,
    ) -> Result<DataExchange, ExchangeError>;
}
