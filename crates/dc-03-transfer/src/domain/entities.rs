//! # Domain Entities

use super::value_objects::TransferState;
use chrono::{DateTime, Utc};
use dc_01_process_store::{IndexEntry, ProcessRecord, StoredRecord};
use serde::{Deserialize, Serialize};
use shared_types::{ProcessKind, DSP_CONTEXT};

/// A transfer process as stored by this connector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferProcess {
    pub id: String,
    pub provider_pid: String,
    pub consumer_pid: String,
    pub state: TransferState,
    /// Agreement the transfer was requested under.
    pub agreement_id: String,
    /// Requested transfer format, e.g. `HTTP_PULL`.
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_address: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferProcess {
    pub fn new(
        provider_pid: impl Into<String>,
        consumer_pid: impl Into<String>,
        agreement_id: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider_pid: provider_pid.into(),
            consumer_pid: consumer_pid.into(),
            state: TransferState::Requested,
            agreement_id: agreement_id.into(),
            format: format.into(),
            data_address: None,
            callback_address: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_message(&self) -> TransferProcessMessage {
        TransferProcessMessage {
            context: DSP_CONTEXT.to_string(),
            message_type: ProcessKind::Transfer.representation_type().to_string(),
            provider_pid: self.provider_pid.clone(),
            consumer_pid: self.consumer_pid.clone(),
            state: self.state,
        }
    }
}

impl StoredRecord for TransferProcess {
    const NAMESPACE: &'static str = "transfer";

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

impl ProcessRecord for TransferProcess {
    fn provider_pid(&self) -> &str {
        &self.provider_pid
    }

    fn consumer_pid(&self) -> &str {
        &self.consumer_pid
    }
}

/// `dspace:TransferProcess` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProcessMessage {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub message_type: String,
    #[serde(rename = "dspace:providerPid")]
    pub provider_pid: String,
    #[serde(rename = "dspace:consumerPid")]
    pub consumer_pid: String,
    #[serde(rename = "dspace:state")]
    pub state: TransferState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shape() {
        let tp = TransferProcess::new("P1", "C1", "A1", "HTTP_PULL");
        let json = serde_json::to_value(tp.to_message()).unwrap();
        assert_eq!(json["@type"], "dspace:TransferProcess");
        assert_eq!(json["dspace:state"], "dspace:REQUESTED");
        assert!(json.get("agreement_id").is_none());
    }
}
