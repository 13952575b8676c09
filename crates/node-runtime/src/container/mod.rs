//! # Connector Container
//!
//! Builds every subsystem over one shared store and one set of keyed locks,
//! and hands the gateway its handles.
//!
//! ```text
//! KeyValueStore ──► ProcessRepository<ContractNegotiation> ──► NegotiationService (dc-02)
//!              ├──► ProcessRepository<TransferProcess>     ──► TransferService    (dc-03)
//!              └──► ProcessRepository<DataExchange>        ──► DataExchangeService(dc-04)
//!                                                                   │
//!                                           HttpPeerSyncClient ◄────┘
//! ```

pub mod config;

pub use config::{ConfigError, ConnectorConfig, StorageBackend};

use crate::adapters::{open_store, PrometheusSyncObserver, PrometheusTransitionObserver};
use anyhow::{Context, Result};
use dc_01_process_store::{KeyValueStore, ProcessRepository};
use dc_02_negotiation::{NegotiationDependencies, NegotiationService};
use dc_03_transfer::{TransferDependencies, TransferService};
use dc_04_data_exchange::{
    DataExchangeService, ExchangeDependencies, HttpPeerSyncClient, PeerSyncClient,
    StaticSelfEndpoint,
};
use dc_05_api_gateway::AppState;
use shared_types::{KeyedLocks, TransitionObserver, UrnUuidGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// All subsystem instances of one connector.
pub struct ConnectorContainer {
    pub negotiations: Arc<NegotiationService>,
    pub transfers: Arc<TransferService>,
    pub exchanges: Arc<DataExchangeService>,
    /// Per-record locks shared by all subsystems.
    pub locks: Arc<KeyedLocks>,
    pub config: ConnectorConfig,
}

impl ConnectorContainer {
    /// Open the configured store and wire the subsystems with the HTTP peer
    /// client.
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        let store = open_store(&config.storage)?;
        let client = HttpPeerSyncClient::new(
            config.sync.request_timeout,
            config.sync.peer_bearer_token.clone(),
        )
        .context("Failed to build peer sync client")?;
        Ok(Self::with_parts(config, store, Arc::new(client)))
    }

    /// Wire the subsystems over the given store and peer client.
    pub fn with_parts(
        config: ConnectorConfig,
        store: Arc<dyn KeyValueStore>,
        sync_client: Arc<dyn PeerSyncClient>,
    ) -> Self {
        let locks = Arc::new(KeyedLocks::new());
        let transitions: Arc<dyn TransitionObserver> = Arc::new(PrometheusTransitionObserver);

        let negotiations = NegotiationService::new(NegotiationDependencies {
            repository: ProcessRepository::new(Arc::clone(&store)),
            pid_generator: Arc::new(UrnUuidGenerator),
            locks: Arc::clone(&locks),
            observer: Arc::clone(&transitions),
        });
        info!("  [02] Contract negotiation initialized");

        let transfers = TransferService::new(TransferDependencies {
            repository: ProcessRepository::new(Arc::clone(&store)),
            pid_generator: Arc::new(UrnUuidGenerator),
            locks: Arc::clone(&locks),
            observer: transitions,
        });
        info!("  [03] Transfer process initialized");

        let exchanges = DataExchangeService::new(ExchangeDependencies {
            repository: ProcessRepository::new(store),
            sync_client,
            self_endpoint: Arc::new(StaticSelfEndpoint::new(
                config.connector.self_endpoint.clone(),
            )),
            locks: Arc::clone(&locks),
            sync: config.sync.to_sync_config(),
            observer: Arc::new(PrometheusSyncObserver),
        });
        info!(
            self_endpoint = %config.connector.self_endpoint,
            "  [04] Data exchange initialized"
        );

        Self {
            negotiations: Arc::new(negotiations),
            transfers: Arc::new(transfers),
            exchanges: Arc::new(exchanges),
            locks,
            config,
        }
    }

    /// Periodically drop lock entries of records nobody is working on.
    pub fn spawn_lock_housekeeping(&self, every: Duration) -> JoinHandle<()> {
        let locks = Arc::clone(&self.locks);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let before = locks.len();
                locks.prune();
                debug!(before, after = locks.len(), "Pruned record locks");
            }
        })
    }

    /// Handles for the gateway.
    pub fn app_state(&self) -> AppState {
        AppState {
            negotiations: self.negotiations.clone(),
            transfers: self.transfers.clone(),
            exchanges: self.exchanges.clone(),
            self_endpoint: self.config.connector.self_endpoint.clone(),
        }
    }
}
