//! # Value Objects
//!
//! Negotiation states and the events that drive them.

use serde::{Deserialize, Serialize};
use shared_types::PidRole;
use std::fmt;

/// Contract negotiation state.
///
/// Serialized with the protocol's `dspace:` prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiationState {
    #[serde(rename = "dspace:REQUESTED")]
    Requested,
    #[serde(rename = "dspace:OFFERED")]
    Offered,
    #[serde(rename = "dspace:ACCEPTED")]
    Accepted,
    #[serde(rename = "dspace:AGREED")]
    Agreed,
    #[serde(rename = "dspace:VERIFIED")]
    Verified,
    #[serde(rename = "dspace:FINALIZED")]
    Finalized,
    #[serde(rename = "dspace:TERMINATED")]
    Terminated,
}

impl NegotiationState {
    pub const ALL: [NegotiationState; 7] = [
        Self::Requested,
        Self::Offered,
        Self::Accepted,
        Self::Agreed,
        Self::Verified,
        Self::Finalized,
        Self::Terminated,
    ];

    /// Check if transition is valid.
    ///
    /// Non-terminal states accept any event: peers are allowed to skip
    /// intermediate steps. FINALIZED only moves to TERMINATED, and TERMINATED
    /// has no outgoing transition.
    pub fn can_transition_to(&self, next: NegotiationState) -> bool {
        match self {
            Self::Terminated => false,
            Self::Finalized => next == Self::Terminated,
            _ => true,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Terminated)
    }

    /// Wire name, e.g. `dspace:AGREED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "dspace:REQUESTED",
            Self::Offered => "dspace:OFFERED",
            Self::Accepted => "dspace:ACCEPTED",
            Self::Agreed => "dspace:AGREED",
            Self::Verified => "dspace:VERIFIED",
            Self::Finalized => "dspace:FINALIZED",
            Self::Terminated => "dspace:TERMINATED",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event carried by a `ContractNegotiationEventMessage`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiationEvent {
    /// Consumer accepts the provider's offer. Sent to the provider.
    #[serde(rename = "dspace:ACCEPTED")]
    Accepted,
    /// Provider finalizes a verified agreement. Sent to the consumer.
    #[serde(rename = "dspace:FINALIZED")]
    Finalized,
}

impl NegotiationEvent {
    /// Parse the wire value of `dspace:eventType`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dspace:ACCEPTED" => Some(Self::Accepted),
            "dspace:FINALIZED" => Some(Self::Finalized),
            _ => None,
        }
    }

    /// Whose pid addresses the record when this event is received.
    ///
    /// ACCEPTED arrives on the provider path (`/negotiations/{providerPid}`),
    /// FINALIZED on the consumer callback path.
    pub fn receiving_role(&self) -> PidRole {
        match self {
            Self::Accepted => PidRole::Provider,
            Self::Finalized => PidRole::Consumer,
        }
    }

    pub fn target_state(&self) -> NegotiationState {
        match self {
            Self::Accepted => NegotiationState::Accepted,
            Self::Finalized => NegotiationState::Finalized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "dspace:ACCEPTED",
            Self::Finalized => "dspace:FINALIZED",
        }
    }
}

impl fmt::Display for NegotiationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional detail of a termination message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationDetail {
    pub code: Option<String>,
    pub reasons: Vec<serde_json::Value>,
}
