//! # Domain Entities
//!
//! The data exchange record, its resources and its service chain.
//!
//! Records are stored and exchanged between participants in the same
//! camelCase JSON shape. Each participant keeps its own copy (a mirror);
//! `provider_data_exchange` / `consumer_data_exchange` hold the id of the
//! copy on the provider's and the consumer's side.
//!
//! Every copy carries a `version` that moves forward with each local change
//! and travels with the snapshot. A participant only applies a snapshot that
//! is newer than its own copy, ordered by `(version, updated_at)`, so pushes
//! that arrive late or out of order cannot roll a mirror back.

use super::chain::ServiceChain;
use chrono::{DateTime, Utc};
use dc_01_process_store::{IndexEntry, StoredRecord};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Index of exchanges by exchange identifier.
pub const IDENTIFIER_INDEX: &str = "identifier";

/// Conventional status values. Status is free-form; peers may send others.
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const IN_PROGRESS: &str = "IN_PROGRESS";
    pub const FAILED: &str = "FAILED";
    pub const COMPLETED: &str = "COMPLETED";
}

/// Length in bytes of a generated exchange key.
pub const EXCHANGE_KEY_BYTES: usize = 32;

/// Generate a fresh exchange key: 32 random bytes, hex-encoded.
pub fn generate_exchange_key() -> String {
    let mut bytes = [0u8; EXCHANGE_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A resource or service offering taking part in the exchange.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResource {
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub completed: bool,
}

/// Local copy of a data exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExchange {
    /// Local record id.
    pub id: String,
    pub exchange_identifier: String,
    /// Shared capability for updates to this exchange.
    pub exchange_key: String,
    #[serde(default)]
    pub resources: Vec<ExchangeResource>,
    pub status: String,
    pub provider_endpoint: String,
    #[serde(default)]
    pub consumer_endpoint: Option<String>,
    #[serde(default)]
    pub provider_data_exchange: Option<String>,
    #[serde(default)]
    pub consumer_data_exchange: Option<String>,
    #[serde(default)]
    pub service_chain: Option<ServiceChain>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub contract: Option<String>,
    /// Bumped on every local change.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataExchange {
    /// Shared view sent to peers.
    pub fn snapshot(&self) -> DataExchangeSnapshot {
        DataExchangeSnapshot {
            exchange_identifier: self.exchange_identifier.clone(),
            exchange_key: self.exchange_key.clone(),
            resources: self.resources.clone(),
            status: self.status.clone(),
            provider_endpoint: self.provider_endpoint.clone(),
            consumer_endpoint: self.consumer_endpoint.clone(),
            provider_data_exchange: self.provider_data_exchange.clone(),
            consumer_data_exchange: self.consumer_data_exchange.clone(),
            service_chain: self.service_chain.clone(),
            payload: self.payload.clone(),
            contract: self.contract.clone(),
            version: self.version,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }

    /// New local mirror of a peer's exchange, at the peer's version.
    pub fn from_snapshot(snapshot: DataExchangeSnapshot) -> Self {
        let now = Utc::now();
        let updated_at = snapshot.updated_at.unwrap_or(now);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            exchange_identifier: snapshot.exchange_identifier,
            exchange_key: snapshot.exchange_key,
            resources: snapshot.resources,
            status: snapshot.status,
            provider_endpoint: snapshot.provider_endpoint,
            consumer_endpoint: snapshot.consumer_endpoint,
            provider_data_exchange: snapshot.provider_data_exchange,
            consumer_data_exchange: snapshot.consumer_data_exchange,
            service_chain: snapshot.service_chain,
            payload: snapshot.payload,
            contract: snapshot.contract,
            version: snapshot.version,
            created_at: now,
            updated_at,
        }
    }

    /// Overwrite the shared view with a peer's, taking over its version.
    ///
    /// The local id, key, identifier and creation time are kept.
    pub fn apply_snapshot(&mut self, snapshot: DataExchangeSnapshot) {
        self.version = snapshot.version;
        if let Some(updated_at) = snapshot.updated_at {
            self.updated_at = updated_at;
        }
        self.resources = snapshot.resources;
        self.status = snapshot.status;
        self.provider_endpoint = snapshot.provider_endpoint;
        self.consumer_endpoint = snapshot.consumer_endpoint;
        self.provider_data_exchange = snapshot.provider_data_exchange;
        self.consumer_data_exchange = snapshot.consumer_data_exchange;
        self.service_chain = snapshot.service_chain;
        self.payload = snapshot.payload;
        self.contract = snapshot.contract;
    }
}

impl StoredRecord for DataExchange {
    const NAMESPACE: &'static str = "exchange";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        vec![IndexEntry::new(IDENTIFIER_INDEX, &self.exchange_identifier)]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

/// A data exchange as sent between participants: everything but the local id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExchangeSnapshot {
    pub exchange_identifier: String,
    pub exchange_key: String,
    #[serde(default)]
    pub resources: Vec<ExchangeResource>,
    pub status: String,
    pub provider_endpoint: String,
    #[serde(default)]
    pub consumer_endpoint: Option<String>,
    #[serde(default)]
    pub provider_data_exchange: Option<String>,
    #[serde(default)]
    pub consumer_data_exchange: Option<String>,
    #[serde(default)]
    pub service_chain: Option<ServiceChain>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DataExchangeSnapshot {
    /// Whether this snapshot is ahead of `current`. Equal positions are not.
    pub fn supersedes(&self, current: &DataExchange) -> bool {
        (self.version, self.updated_at) > (current.version, Some(current.updated_at))
    }
}

/// Input for creating an exchange on this connector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataExchange {
    /// Generated when absent.
    #[serde(default)]
    pub exchange_identifier: Option<String>,
    pub provider_endpoint: String,
    #[serde(default)]
    pub consumer_endpoint: Option<String>,
    #[serde(default)]
    pub resources: Vec<ExchangeResource>,
    #[serde(default)]
    pub service_chain: Option<ServiceChain>,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}
