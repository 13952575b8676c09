//! # Inbound Ports

use crate::domain::{TransferError, TransferProcess};
use async_trait::async_trait;
use shared_types::PidLookup;

/// Contents of a `TransferRequestMessage` received by a provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransferRequest {
    pub consumer_pid: String,
    /// Present when the consumer refers to an existing transfer.
    pub provider_pid: Option<String>,
    pub agreement_id: String,
    pub format: String,
    pub data_address: Option<serde_json::Value>,
    pub callback_address: Option<String>,
}

/// Transfer API - inbound port.
///
/// Transitions resolve the process by whichever pid the caller's role
/// supplies; both are never required.
#[async_trait]
pub trait TransferApi: Send + Sync {
    async fn get(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError>;

    /// Create a REQUESTED transfer with a generated provider pid, or return the
    /// existing one when the request names a provider pid.
    async fn create_from_request(
        &self,
        request: TransferRequest,
    ) -> Result<TransferProcess, TransferError>;

    /// Move to STARTED. A SUSPENDED transfer is left as is.
    async fn start(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError>;

    async fn complete(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError>;

    async fn suspend(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError>;

    async fn terminate(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError>;
}
