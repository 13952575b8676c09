//! # Sync Dispatcher
//!
//! Pushes exchange snapshots to peers with bounded concurrency and a
//! per-call timeout. Peers that fail are retried in the background with
//! exponential backoff and jitter. Each retry re-reads the exchange, so a peer
//! that comes back receives the latest state rather than the one that failed.

use crate::domain::{DataExchange, DataExchangeSnapshot, PeerSyncError};
use crate::ports::outbound::{PeerSyncClient, SyncObserver, SyncOutcome};
use dc_01_process_store::ProcessRepository;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Push and retry policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Timeout of a single call to a peer.
    pub request_timeout: Duration,
    /// Calls in flight across all exchanges.
    pub max_concurrent: usize,
    /// Background retries after the first failed push. Zero disables retry.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_concurrent: 16,
            max_retries: 5,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    /// Delay before retry number `retry` (1-based), jitter excluded.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

/// Result of pushing one exchange to a set of peers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Inner {
    client: Arc<dyn PeerSyncClient>,
    repository: ProcessRepository<DataExchange>,
    permits: Arc<Semaphore>,
    config: SyncConfig,
    observer: Arc<dyn SyncObserver>,
    pending: AtomicUsize,
}

/// Cheap to clone; clones share permits and the retry counter.
#[derive(Clone)]
pub struct SyncDispatcher {
    inner: Arc<Inner>,
}

impl SyncDispatcher {
    pub fn new(
        client: Arc<dyn PeerSyncClient>,
        repository: ProcessRepository<DataExchange>,
        config: SyncConfig,
        observer: Arc<dyn SyncObserver>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            inner: Arc::new(Inner {
                client,
                repository,
                permits,
                config,
                observer,
                pending: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Background retries still running.
    pub fn pending_retries(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Push `exchange` to every endpoint concurrently. Failed endpoints are
    /// handed to the background retry loop before this returns.
    pub async fn push(&self, exchange: &DataExchange, endpoints: &[String]) -> SyncReport {
        let snapshot = Arc::new(exchange.snapshot());
        let mut calls = JoinSet::new();
        for (index, endpoint) in endpoints.iter().enumerate() {
            let this = self.clone();
            let endpoint = endpoint.clone();
            let snapshot = Arc::clone(&snapshot);
            calls.spawn(async move {
                let result = this.attempt(&endpoint, &snapshot).await;
                (index, endpoint, result)
            });
        }

        let mut results = Vec::with_capacity(endpoints.len());
        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!("[dc-04] Sync task failed to complete: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);

        let mut report = SyncReport::default();
        for (_, endpoint, result) in results {
            match result {
                Ok(()) => {
                    self.inner
                        .observer
                        .sync_attempted(&endpoint, SyncOutcome::Delivered);
                    report.delivered.push(endpoint);
                }
                Err(e) => {
                    warn!(
                        exchange_id = %exchange.id,
                        endpoint = %endpoint,
                        "[dc-04] Sync failed: {}",
                        e
                    );
                    self.inner
                        .observer
                        .sync_attempted(&endpoint, SyncOutcome::Failed);
                    self.schedule_retry(exchange.id.clone(), endpoint.clone());
                    report.failed.push(endpoint);
                }
            }
        }
        report
    }

    /// Create a mirror at `endpoint` under the same permit and timeout rules
    /// as a push. Mirror creation is not retried.
    pub async fn create_mirror(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<String, PeerSyncError> {
        let _permit = self.permit().await?;
        let timeout = self.inner.config.request_timeout;
        tokio::time::timeout(timeout, self.inner.client.create_mirror(endpoint, snapshot))
            .await
            .map_err(|_| PeerSyncError::Timeout(timeout.as_millis() as u64))?
    }

    async fn permit(&self) -> Result<tokio::sync::OwnedSemaphorePermit, PeerSyncError> {
        Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| PeerSyncError::Transport("dispatcher shut down".into()))
    }

    async fn attempt(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<(), PeerSyncError> {
        let _permit = self.permit().await?;
        let timeout = self.inner.config.request_timeout;
        tokio::time::timeout(timeout, self.inner.client.push_update(endpoint, snapshot))
            .await
            .map_err(|_| PeerSyncError::Timeout(timeout.as_millis() as u64))?
    }

    fn schedule_retry(&self, exchange_id: String, endpoint: String) {
        let max_retries = self.inner.config.max_retries;
        if max_retries == 0 {
            self.inner
                .observer
                .sync_attempted(&endpoint, SyncOutcome::Abandoned);
            return;
        }

        let pending = self.inner.pending.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.observer.retries_pending(pending);

        let this = self.clone();
        tokio::spawn(async move {
            this.retry_loop(&exchange_id, &endpoint).await;
            let pending = this.inner.pending.fetch_sub(1, Ordering::SeqCst) - 1;
            this.inner.observer.retries_pending(pending);
        });
    }

    async fn retry_loop(&self, exchange_id: &str, endpoint: &str) {
        let config = &self.inner.config;
        for retry in 1..=config.max_retries {
            let jitter_cap = config.base_backoff.as_millis() as u64 / 2;
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_cap));
            tokio::time::sleep(config.backoff(retry) + jitter).await;

            let latest = match self.inner.repository.get(exchange_id) {
                Ok(Some(exchange)) => exchange,
                Ok(None) => {
                    warn!(exchange_id, "[dc-04] Exchange vanished, dropping retry");
                    return;
                }
                Err(e) => {
                    warn!(exchange_id, "[dc-04] Cannot reload exchange for retry: {}", e);
                    continue;
                }
            };

            match self.attempt(endpoint, &latest.snapshot()).await {
                Ok(()) => {
                    info!(exchange_id, endpoint, retry, "[dc-04] Sync delivered on retry");
                    self.inner
                        .observer
                        .sync_attempted(endpoint, SyncOutcome::Delivered);
                    return;
                }
                Err(e) => {
                    debug!(exchange_id, endpoint, retry, "[dc-04] Retry failed: {}", e);
                    self.inner
                        .observer
                        .sync_attempted(endpoint, SyncOutcome::Failed);
                }
            }
        }

        warn!(
            exchange_id,
            endpoint,
            "[dc-04] Giving up on peer after {} retries",
            config.max_retries
        );
        self.inner
            .observer
            .sync_attempted(endpoint, SyncOutcome::Abandoned);
    }
}
