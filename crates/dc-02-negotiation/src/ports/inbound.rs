//! # Inbound Ports
//!
//! API trait defining what the Negotiation subsystem can do.

use crate::domain::{ContractNegotiation, NegotiationError, NegotiationEvent, TerminationDetail};
use async_trait::async_trait;
use shared_types::{PidLookup, PidRole};

/// Contents of a `ContractRequestMessage` received by a provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NegotiationRequest {
    pub consumer_pid: String,
    /// Present when the consumer refers to an existing negotiation.
    pub provider_pid: Option<String>,
    pub callback_address: Option<String>,
}

/// Contents of a `ContractOfferMessage` received by a consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NegotiationOffer {
    pub provider_pid: Option<String>,
    pub callback_address: Option<String>,
}

/// Negotiation API - inbound port.
#[async_trait]
pub trait NegotiationApi: Send + Sync {
    /// Resolve a negotiation.
    async fn get(&self, lookup: &PidLookup) -> Result<ContractNegotiation, NegotiationError>;

    /// Provider receives a contract request.
    ///
    /// Without a provider pid a new REQUESTED negotiation is created with a
    /// generated provider pid. With one, the existing negotiation is returned
    /// unchanged, or NotFound.
    async fn create_from_request(
        &self,
        request: NegotiationRequest,
    ) -> Result<ContractNegotiation, NegotiationError>;

    /// Consumer receives a provider-initiated offer; creates an OFFERED
    /// negotiation with a generated consumer pid.
    async fn create_from_offer(
        &self,
        offer: NegotiationOffer,
    ) -> Result<ContractNegotiation, NegotiationError>;

    /// A request (or counter-offer) on an existing negotiation moves it to
    /// OFFERED. Resolved by the conjunction of both pids.
    async fn accept_offer_as_request(
        &self,
        lookup: &PidLookup,
    ) -> Result<ContractNegotiation, NegotiationError>;

    /// ACCEPTED on the provider path, FINALIZED on the consumer path.
    async fn apply_event(
        &self,
        path_role: PidRole,
        lookup: &PidLookup,
        event: NegotiationEvent,
    ) -> Result<ContractNegotiation, NegotiationError>;

    /// Consumer receives the provider's agreement; moves to AGREED.
    async fn record_agreement(
        &self,
        lookup: &PidLookup,
    ) -> Result<ContractNegotiation, NegotiationError>;

    /// Provider receives the consumer's verification; moves to VERIFIED.
    async fn verify_agreement(
        &self,
        provider_pid: &str,
    ) -> Result<ContractNegotiation, NegotiationError>;

    /// Either side terminates the negotiation.
    async fn terminate(
        &self,
        lookup: &PidLookup,
        detail: TerminationDetail,
    ) -> Result<ContractNegotiation, NegotiationError>;
}
