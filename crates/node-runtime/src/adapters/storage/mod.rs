//! # Storage Backends
//!
//! `memory` uses the process store's `InMemoryKVStore`. `rocksdb` needs the
//! `rocksdb` feature:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use crate::container::config::{StorageBackend, StorageConfig};
use anyhow::Result;
use dc_01_process_store::{InMemoryKVStore, KeyValueStore};
use std::sync::Arc;
use tracing::info;

/// Open the configured backend.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Storage: in-memory (records are lost on restart)");
            Ok(Arc::new(InMemoryKVStore::new()))
        }
        StorageBackend::Rocksdb => open_rocksdb(config),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    use anyhow::Context;

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data dir {:?}", config.data_dir))?;
    let rocks = RocksDbConfig::in_data_dir(&config.data_dir);
    info!("Storage: RocksDB at {:?}", rocks.path);
    let store = RocksDbStore::open(rocks).context("Failed to open RocksDB store")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    anyhow::bail!("storage backend 'rocksdb' requires building with the `rocksdb` feature")
}
