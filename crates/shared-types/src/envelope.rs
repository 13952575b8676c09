//! # Message Envelope
//!
//! Constants of the protocol message envelope:
//! `{"@context": <context>, "@type": <message type>, ...}`.

use serde::{Deserialize, Serialize};

/// Fixed JSON-LD context carried by every protocol message.
pub const DSP_CONTEXT: &str = "https://w3id.org/dspace/2024/1/context.json";

/// Protocol version advertised at `/.well-known/dspace-version`.
pub const DSP_PROTOCOL_VERSION: &str = "2024-1";

/// Envelope key for the context URI.
pub const CONTEXT_KEY: &str = "@context";

/// Envelope key for the message type.
pub const TYPE_KEY: &str = "@type";

/// Field names used inside protocol messages.
pub mod fields {
    pub const PROVIDER_PID: &str = "dspace:providerPid";
    pub const CONSUMER_PID: &str = "dspace:consumerPid";
    pub const STATE: &str = "dspace:state";
    pub const OFFER: &str = "dspace:offer";
    pub const AGREEMENT: &str = "dspace:agreement";
    pub const AGREEMENT_ID: &str = "dspace:agreementId";
    pub const CALLBACK_ADDRESS: &str = "dspace:callbackAddress";
    pub const EVENT_TYPE: &str = "dspace:eventType";
    pub const CODE: &str = "dspace:code";
    pub const REASON: &str = "dspace:reason";
    pub const DATA_ADDRESS: &str = "dspace:dataAddress";
    pub const FORMAT: &str = "dct:format";
}

/// Message types accepted or produced by the connector.
pub mod message_types {
    pub const CONTRACT_NEGOTIATION: &str = "dspace:ContractNegotiation";
    pub const CONTRACT_REQUEST: &str = "dspace:ContractRequestMessage";
    pub const CONTRACT_OFFER: &str = "dspace:ContractOfferMessage";
    pub const CONTRACT_AGREEMENT: &str = "dspace:ContractAgreementMessage";
    pub const CONTRACT_AGREEMENT_VERIFICATION: &str =
        "dspace:ContractAgreementVerificationMessage";
    pub const CONTRACT_NEGOTIATION_EVENT: &str = "dspace:ContractNegotiationEventMessage";
    pub const CONTRACT_NEGOTIATION_TERMINATION: &str =
        "dspace:ContractNegotiationTerminationMessage";

    pub const TRANSFER_PROCESS: &str = "dspace:TransferProcess";
    pub const TRANSFER_REQUEST: &str = "dspace:TransferRequestMessage";
    pub const TRANSFER_START: &str = "dspace:TransferStartMessage";
    pub const TRANSFER_COMPLETION: &str = "dspace:TransferCompletionMessage";
    pub const TRANSFER_SUSPENSION: &str = "dspace:TransferSuspensionMessage";
    pub const TRANSFER_TERMINATION: &str = "dspace:TransferTerminationMessage";
}

/// Which protocol a process record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    /// Contract negotiation.
    Negotiation,
    /// Transfer process.
    Transfer,
}

impl ProcessKind {
    /// Short label used in metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessKind::Negotiation => "negotiation",
            ProcessKind::Transfer => "transfer",
        }
    }

    /// `@type` of the process representation returned to peers.
    pub fn representation_type(&self) -> &'static str {
        match self {
            ProcessKind::Negotiation => message_types::CONTRACT_NEGOTIATION,
            ProcessKind::Transfer => message_types::TRANSFER_PROCESS,
        }
    }
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
