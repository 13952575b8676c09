//! # Domain Entities
//!
//! The persisted negotiation record and its protocol representation.

use super::value_objects::NegotiationState;
use chrono::{DateTime, Utc};
use dc_01_process_store::{IndexEntry, ProcessRecord, StoredRecord};
use serde::{Deserialize, Serialize};
use shared_types::{ProcessKind, DSP_CONTEXT};

/// A contract negotiation as stored by this connector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractNegotiation {
    /// Local record id, never sent to peers.
    pub id: String,
    pub provider_pid: String,
    pub consumer_pid: String,
    pub state: NegotiationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractNegotiation {
    pub fn new(
        provider_pid: impl Into<String>,
        consumer_pid: impl Into<String>,
        state: NegotiationState,
        callback_address: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider_pid: provider_pid.into(),
            consumer_pid: consumer_pid.into(),
            state,
            callback_address,
            created_at: now,
            updated_at: now,
        }
    }

    /// Protocol representation returned to peers.
    pub fn to_message(&self) -> ContractNegotiationMessage {
        ContractNegotiationMessage {
            context: DSP_CONTEXT.to_string(),
            message_type: ProcessKind::Negotiation.representation_type().to_string(),
            provider_pid: self.provider_pid.clone(),
            consumer_pid: self.consumer_pid.clone(),
            state: self.state,
        }
    }
}

impl StoredRecord for ContractNegotiation {
    const NAMESPACE: &'static str = "negotiation";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        self.pid_entries()
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl ProcessRecord for ContractNegotiation {
    fn provider_pid(&self) -> &str {
        &self.provider_pid
    }

    fn consumer_pid(&self) -> &str {
        &self.consumer_pid
    }
}

/// `dspace:ContractNegotiation` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractNegotiationMessage {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub message_type: String,
    #[serde(rename = "dspace:providerPid")]
    pub provider_pid: String,
    #[serde(rename = "dspace:consumerPid")]
    pub consumer_pid: String,
    #[serde(rename = "dspace:state")]
    pub state: NegotiationState,
}
