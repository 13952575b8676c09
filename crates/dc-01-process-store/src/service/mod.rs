//! # Process Repository
//!
//! Typed repository over a [`KeyValueStore`].
//!
//! ## Key Layout
//!
//! ```text
//! {namespace}:rec:{id}              -> JSON record
//! {namespace}:idx:{index}:{value}   -> id
//! ```
//!
//! A record and all of its index keys are written in one atomic batch. Stale
//! index keys left behind by a changed value are deleted in the same batch.
//!
//! The repository does not serialize writers. Callers that read, modify and
//! save a record hold the record's [`shared_types::KeyedLocks`] entry.

use crate::domain::errors::StoreError;
use crate::domain::record::{IndexEntry, ProcessRecord, StoredRecord, CONSUMER_INDEX, PROVIDER_INDEX};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use chrono::Utc;
use shared_types::PidLookup;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Repository of one record type.
pub struct ProcessRepository<T> {
    store: Arc<dyn KeyValueStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ProcessRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: StoredRecord> ProcessRepository<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn record_key(id: &str) -> Vec<u8> {
        format!("{}:rec:{}", T::NAMESPACE, id).into_bytes()
    }

    fn record_prefix() -> Vec<u8> {
        format!("{}:rec:", T::NAMESPACE).into_bytes()
    }

    fn index_key(entry: &IndexEntry) -> Vec<u8> {
        format!("{}:idx:{}:{}", T::NAMESPACE, entry.index, entry.value).into_bytes()
    }

    /// Load a record by local id.
    pub fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(&Self::record_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Id of the record bound to an index value.
    pub fn resolve_index(&self, index: &'static str, value: &str) -> Result<Option<String>, StoreError> {
        let entry = IndexEntry::new(index, value);
        match self.store.get(&Self::index_key(&entry))? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Load the record bound to an index value.
    pub fn find_by_index(&self, index: &'static str, value: &str) -> Result<Option<T>, StoreError> {
        let Some(id) = self.resolve_index(index, value)? else {
            return Ok(None);
        };
        let record = self.get(&id)?;
        if record.is_none() {
            warn!(
                "[dc-01] {} index '{}' points at missing record {}",
                index, value, id
            );
        }
        Ok(record)
    }

    /// Insert a new record.
    ///
    /// Fails if the id or any index value is already taken.
    pub fn create(&self, record: &T) -> Result<(), StoreError> {
        let key = Self::record_key(record.id());
        if self.store.exists(&key)? {
            return Err(StoreError::DuplicateIndex {
                index: "id",
                value: record.id().to_string(),
                existing_id: record.id().to_string(),
            });
        }

        let entries = record.index_entries();
        self.check_indexes_free(record.id(), &entries)?;

        let mut batch = Vec::with_capacity(entries.len() + 1);
        batch.push(BatchOperation::put(key, serde_json::to_vec(record)?));
        for entry in &entries {
            batch.push(BatchOperation::put(
                Self::index_key(entry),
                record.id().as_bytes().to_vec(),
            ));
        }
        self.store.atomic_batch_write(batch)?;

        debug!("[dc-01] Created {} record {}", T::NAMESPACE, record.id());
        Ok(())
    }

    /// Persist changes to an existing record, refreshing its modification time.
    pub fn save(&self, record: &mut T) -> Result<(), StoreError> {
        record.touch(Utc::now());
        self.replace(record)
    }

    /// Persist an existing record exactly as given, without touching it.
    pub fn replace(&self, record: &T) -> Result<(), StoreError> {
        let previous = self
            .get(record.id())?
            .ok_or_else(|| StoreError::RecordNotFound {
                id: record.id().to_string(),
            })?;

        let entries = record.index_entries();
        self.check_indexes_free(record.id(), &entries)?;

        let current: HashSet<&IndexEntry> = entries.iter().collect();
        let mut batch = Vec::with_capacity(entries.len() + 2);
        for stale in previous.index_entries().iter().filter(|e| !current.contains(e)) {
            batch.push(BatchOperation::delete(Self::index_key(stale)));
        }
        batch.push(BatchOperation::put(
            Self::record_key(record.id()),
            serde_json::to_vec(record)?,
        ));
        for entry in &entries {
            batch.push(BatchOperation::put(
                Self::index_key(entry),
                record.id().as_bytes().to_vec(),
            ));
        }
        self.store.atomic_batch_write(batch)?;
        Ok(())
    }

    /// Every record of this type, in id order.
    pub fn list(&self) -> Result<Vec<T>, StoreError> {
        self.store
            .prefix_scan(&Self::record_prefix())?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(StoreError::from))
            .collect()
    }

    fn check_indexes_free(&self, id: &str, entries: &[IndexEntry]) -> Result<(), StoreError> {
        for entry in entries {
            if let Some(existing) = self.resolve_index(entry.index, &entry.value)? {
                if existing != id {
                    return Err(StoreError::DuplicateIndex {
                        index: entry.index,
                        value: entry.value.clone(),
                        existing_id: existing,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<T: ProcessRecord> ProcessRepository<T> {
    /// Resolve a process by provider pid, consumer pid, or both.
    ///
    /// With both, the record found through the provider pid must also carry
    /// the given consumer pid.
    pub fn find(&self, lookup: &PidLookup) -> Result<Option<T>, StoreError> {
        let found = match lookup {
            PidLookup::Provider(pid) => self.find_by_index(PROVIDER_INDEX, pid)?,
            PidLookup::Consumer(pid) => self.find_by_index(CONSUMER_INDEX, pid)?,
            PidLookup::Both { provider, .. } => self.find_by_index(PROVIDER_INDEX, provider)?,
        };
        Ok(found.filter(|r| lookup.matches(r.provider_pid(), r.consumer_pid())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::InMemoryKVStore;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: String,
        provider_pid: String,
        consumer_pid: String,
        note: String,
        updated_at: DateTime<Utc>,
    }

    impl StoredRecord for Sample {
        const NAMESPACE: &'static str = "sample";

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

    impl ProcessRecord for Sample {
        fn provider_pid(&self) -> &str {
            &self.provider_pid
        }

        fn consumer_pid(&self) -> &str {
            &self.consumer_pid
        }
    }

    fn sample(id: &str, provider: &str, consumer: &str) -> Sample {
        Sample {
            id: id.into(),
            provider_pid: provider.into(),
            consumer_pid: consumer.into(),
            note: String::new(),
            updated_at: epoch(),
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn repo() -> ProcessRepository<Sample> {
        ProcessRepository::new(Arc::new(InMemoryKVStore::new()))
    }

    #[test]
    fn test_find_by_either_half() {
        let repo = repo();
        repo.create(&sample("1", "P1", "C1")).unwrap();

        let by_provider = repo.find(&PidLookup::Provider("P1".into())).unwrap().unwrap();
        assert_eq!(by_provider.consumer_pid, "C1");

        let by_consumer = repo.find(&PidLookup::Consumer("C1".into())).unwrap().unwrap();
        assert_eq!(by_consumer.id, "1");
    }

    #[test]
    fn test_absent_id_is_none() {
        let repo = repo();
        assert!(repo.find(&PidLookup::Provider("nope".into())).unwrap().is_none());
        assert!(repo.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_conjunction_rejects_mismatched_half() {
        let repo = repo();
        repo.create(&sample("1", "P1", "C1")).unwrap();
        repo.create(&sample("2", "P2", "C2")).unwrap();

        let crossed = PidLookup::Both {
            provider: "P1".into(),
            consumer: "C2".into(),
        };
        assert!(repo.find(&crossed).unwrap().is_none());

        let exact = PidLookup::Both {
            provider: "P2".into(),
            consumer: "C2".into(),
        };
        assert_eq!(repo.find(&exact).unwrap().unwrap().id, "2");
    }

    #[test]
    fn test_duplicate_pid_rejected() {
        let repo = repo();
        repo.create(&sample("1", "P1", "C1")).unwrap();

        let err = repo.create(&sample("2", "P2", "C1")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateIndex { index: CONSUMER_INDEX, .. }
        ));
        assert!(repo.get("2").unwrap().is_none());
    }

    #[test]
    fn test_save_refreshes_timestamp_and_reindexes() {
        let repo = repo();
        let mut record = sample("1", "P1", "C1");
        repo.create(&record).unwrap();

        record.provider_pid = "P1b".into();
        record.note = "changed".into();
        repo.save(&mut record).unwrap();

        assert!(record.updated_at > epoch());
        assert!(repo.find(&PidLookup::Provider("P1".into())).unwrap().is_none());
        let loaded = repo.find(&PidLookup::Provider("P1b".into())).unwrap().unwrap();
        assert_eq!(loaded.note, "changed");
    }

    #[test]
    fn test_save_unknown_record_fails() {
        let repo = repo();
        let mut record = sample("9", "P9", "C9");
        assert!(matches!(
            repo.save(&mut record),
            Err(StoreError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_replace_keeps_timestamp() {
        let repo = repo();
        let mut record = sample("1", "P1", "C1");
        repo.create(&record).unwrap();

        record.note = "as given".into();
        repo.replace(&record).unwrap();

        let loaded = repo.get("1").unwrap().unwrap();
        assert_eq!(loaded.note, "as given");
        assert_eq!(loaded.updated_at, epoch());
    }

    #[test]
    fn test_list_returns_all() {
        let repo = repo();
        repo.create(&sample("1", "P1", "C1")).unwrap();
        repo.create(&sample("2", "P2", "C2")).unwrap();
        assert_eq!(repo.list().unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_created_record_round_trips_by_provider(
            provider in "[A-Za-z0-9:-]{1,24}",
            consumer in "[A-Za-z0-9:-]{1,24}",
        ) {
            let repo = repo();
            repo.create(&sample("r", &provider, &consumer)).unwrap();
            let found = repo.find(&PidLookup::Provider(provider.clone())).unwrap().unwrap();
            prop_assert_eq!(found.consumer_pid, consumer);
        }
    }
}
