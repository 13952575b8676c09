//! # Stored Records
//!
//! What the repository needs to know about a record: its namespace, its local
//! id, the secondary index values it must be findable by, and how to stamp its
//! modification time.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Index of records by provider pid.
pub const PROVIDER_INDEX: &str = "provider";

/// Index of records by consumer pid.
pub const CONSUMER_INDEX: &str = "consumer";

/// One secondary index value of a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub index: &'static str,
    pub value: String,
}

impl IndexEntry {
    pub fn new(index: &'static str, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// A record that can be kept in a [`crate::ProcessRepository`].
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Key prefix separating this record type from others in the same store.
    const NAMESPACE: &'static str;

    /// Local, immutable record id.
    fn id(&self) -> &str;

    /// Secondary index values. Each value maps to at most one record.
    fn index_entries(&self) -> Vec<IndexEntry>;

    /// Refresh the modification timestamp.
    fn touch(&mut self, now: DateTime<Utc>);
}

/// A protocol process known by a provider pid and a consumer pid.
pub trait ProcessRecord: StoredRecord {
    fn provider_pid(&self) -> &str;
    fn consumer_pid(&self) -> &str;

    /// Index entries for the pid pair; empty halves are not indexed.
    fn pid_entries(&self) -> Vec<IndexEntry> {
        let mut entries = Vec::with_capacity(2);
        if !self.provider_pid().is_empty() {
            entries.push(IndexEntry::new(PROVIDER_INDEX, self.provider_pid()));
        }
        if !self.consumer_pid().is_empty() {
            entries.push(IndexEntry::new(CONSUMER_INDEX, self.consumer_pid()));
        }
        entries
    }
}
