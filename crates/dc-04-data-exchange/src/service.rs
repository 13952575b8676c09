//! # Data Exchange Service
//!
//! Implements [`DataExchangeApi`].
//!
//! Local changes are made under the record lock and saved before any peer is
//! contacted. Propagation goes through the [`SyncDispatcher`]; a peer that
//! does not accept the update never rolls the local change back.
//!
//! Pushes for one exchange may overlap and land out of order. Receivers only
//! apply a snapshot that supersedes their copy, so the newest state wins.

use crate::adapters::sync_dispatcher::{SyncConfig, SyncDispatcher};
use crate::domain::{
    generate_exchange_key, normalize_endpoint, status, DataExchange, DataExchangeSnapshot,
    ExchangeError, KeyRejection, NewDataExchange, IDENTIFIER_INDEX,
};
use crate::ports::inbound::DataExchangeApi;
use crate::ports::outbound::{PeerSyncClient, SelfEndpoint, SyncObserver};
use async_trait::async_trait;
use chrono::Utc;
use dc_01_process_store::{ProcessRepository, StoreError, StoredRecord};
use shared_types::KeyedLocks;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

/// Dependencies for [`DataExchangeService`].
pub struct ExchangeDependencies {
    pub repository: ProcessRepository<DataExchange>,
    pub sync_client: Arc<dyn PeerSyncClient>,
    pub self_endpoint: Arc<dyn SelfEndpoint>,
    pub locks: Arc<KeyedLocks>,
    pub sync: SyncConfig,
    pub observer: Arc<dyn SyncObserver>,
}

/// Data exchange orchestrator.
pub struct DataExchangeService {
    repository: ProcessRepository<DataExchange>,
    self_endpoint: Arc<dyn SelfEndpoint>,
    locks: Arc<KeyedLocks>,
    dispatcher: SyncDispatcher,
}

/// Constant-time comparison of a presented key with the stored one.
pub fn keys_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

impl DataExchangeService {
    pub fn new(deps: ExchangeDependencies) -> Self {
        let dispatcher = SyncDispatcher::new(
            deps.sync_client,
            deps.repository.clone(),
            deps.sync,
            deps.observer,
        );
        Self {
            repository: deps.repository,
            self_endpoint: deps.self_endpoint,
            locks: deps.locks,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &SyncDispatcher {
        &self.dispatcher
    }

    fn record_lock_key(id: &str) -> String {
        format!("{}:{}", DataExchange::NAMESPACE, id)
    }

    fn identifier_lock_key(identifier: &str) -> String {
        format!("{}:{}:{}", DataExchange::NAMESPACE, IDENTIFIER_INDEX, identifier)
    }

    fn load(&self, id: &str) -> Result<DataExchange, ExchangeError> {
        self.repository
            .get(id)?
            .ok_or_else(|| ExchangeError::NotFound(id.to_string()))
    }

    fn is_self(&self, endpoint: &str) -> bool {
        self.self_endpoint.is_self(endpoint)
    }

    /// The one neighbor to sync with when there is no chain: the provider
    /// unless that is us, otherwise the consumer.
    fn neighbor(&self, exchange: &DataExchange) -> Option<String> {
        if !exchange.provider_endpoint.is_empty() && !self.is_self(&exchange.provider_endpoint) {
            return Some(normalize_endpoint(&exchange.provider_endpoint));
        }
        exchange
            .consumer_endpoint
            .as_deref()
            .filter(|c| !c.is_empty() && !self.is_self(c))
            .map(normalize_endpoint)
    }

    /// Every endpoint that must receive a change to `exchange`.
    fn sync_targets(&self, exchange: &DataExchange) -> Vec<String> {
        match &exchange.service_chain {
            Some(chain) => chain
                .connectors()
                .into_iter()
                .filter(|c| !self.is_self(c))
                .collect(),
            None => self.neighbor(exchange).into_iter().collect(),
        }
    }

    async fn push(
        &self,
        exchange: &DataExchange,
        endpoints: &[String],
    ) -> Result<(), ExchangeError> {
        if endpoints.is_empty() {
            debug!(exchange_id = %exchange.id, "[dc-04] No peer to sync");
            return Ok(());
        }
        let report = self.dispatcher.push(exchange, endpoints).await;
        if report.is_complete() {
            Ok(())
        } else {
            Err(ExchangeError::SyncFailed {
                exchange_id: exchange.id.clone(),
                endpoints: report.failed,
            })
        }
    }

    async fn fan_out(&self, exchange: DataExchange) -> Result<DataExchange, ExchangeError> {
        let targets = self.sync_targets(&exchange);
        self.push(&exchange, &targets).await?;
        Ok(exchange)
    }

    async fn mirror_at(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<String, ExchangeError> {
        self.dispatcher
            .create_mirror(endpoint, snapshot)
            .await
            .map_err(|source| ExchangeError::MirrorFailed {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    /// Point the self-reference at `exchange.id` for whichever role we play.
    fn self_reference(&self, exchange: &mut DataExchange) {
        if self.is_self(&exchange.provider_endpoint) {
            exchange.provider_data_exchange = Some(exchange.id.clone());
        } else if exchange
            .consumer_endpoint
            .as_deref()
            .is_some_and(|c| self.is_self(c))
        {
            exchange.consumer_data_exchange = Some(exchange.id.clone());
        }
    }

    fn creation_error(err: StoreError) -> ExchangeError {
        match err {
            StoreError::DuplicateIndex { value, .. } => {
                ExchangeError::Validation(format!("exchange identifier '{}' already in use", value))
            }
            other => ExchangeError::Store(other),
        }
    }
}

#[async_trait]
impl DataExchangeApi for DataExchangeService {
    async fn get(&self, id: &str) -> Result<DataExchange, ExchangeError> {
        self.load(id)
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<DataExchange, ExchangeError> {
        self.repository
            .find_by_index(IDENTIFIER_INDEX, identifier)?
            .ok_or_else(|| ExchangeError::NotFound(identifier.to_string()))
    }

    async fn create(&self, new: NewDataExchange) -> Result<DataExchange, ExchangeError> {
        if new.provider_endpoint.trim().is_empty() {
            return Err(ExchangeError::Validation("providerEndpoint is required".into()));
        }
        let identifier = new
            .exchange_identifier
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let _guard = self
            .locks
            .acquire(&Self::identifier_lock_key(&identifier))
            .await;

        let mut service_chain = new.service_chain;
        if let Some(chain) = service_chain.as_mut() {
            chain.apply_defaults(&self.self_endpoint.endpoint(), new.consumer_endpoint.as_deref());
        }

        let now = Utc::now();
        let mut exchange = DataExchange {
            id: uuid::Uuid::new_v4().to_string(),
            exchange_identifier: identifier,
            exchange_key: generate_exchange_key(),
            resources: new.resources,
            status: status::PENDING.to_string(),
            provider_endpoint: normalize_endpoint(&new.provider_endpoint),
            consumer_endpoint: new.consumer_endpoint.map(|c| normalize_endpoint(&c)),
            provider_data_exchange: None,
            consumer_data_exchange: None,
            service_chain,
            payload: new.payload,
            contract: new.contract,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.self_reference(&mut exchange);
        self.repository
            .create(&exchange)
            .map_err(Self::creation_error)?;

        info!(
            exchange_id = %exchange.id,
            identifier = %exchange.exchange_identifier,
            "[dc-04] Data exchange created"
        );

        let we_are_provider = self.is_self(&exchange.provider_endpoint);
        let counterpart = if we_are_provider {
            exchange
                .consumer_endpoint
                .clone()
                .filter(|c| !c.is_empty() && !self.is_self(c))
        } else {
            Some(exchange.provider_endpoint.clone())
        };

        if let Some(counterpart) = counterpart {
            let remote_id = self.mirror_at(&counterpart, &exchange.snapshot()).await?;
            if we_are_provider {
                exchange.consumer_data_exchange = Some(remote_id);
            } else {
                exchange.provider_data_exchange = Some(remote_id);
            }
            // The counterpart's copy already names both sides at this version.
            self.repository.replace(&exchange)?;
            info!(
                exchange_id = %exchange.id,
                endpoint = %counterpart,
                "[dc-04] Mirror created at counterpart"
            );
        }
        Ok(exchange)
    }

    async fn create_mirror(
        &self,
        snapshot: DataExchangeSnapshot,
    ) -> Result<DataExchange, ExchangeError> {
        if snapshot.exchange_identifier.is_empty() {
            return Err(ExchangeError::Validation("exchangeIdentifier is required".into()));
        }
        if snapshot.exchange_key.is_empty() {
            return Err(ExchangeError::Validation("exchangeKey is required".into()));
        }
        if snapshot.provider_endpoint.is_empty() {
            return Err(ExchangeError::Validation("providerEndpoint is required".into()));
        }

        let _guard = self
            .locks
            .acquire(&Self::identifier_lock_key(&snapshot.exchange_identifier))
            .await;

        if let Some(existing) = self
            .repository
            .find_by_index(IDENTIFIER_INDEX, &snapshot.exchange_identifier)?
        {
            if !keys_match(&existing.exchange_key, &snapshot.exchange_key) {
                warn!(
                    identifier = %snapshot.exchange_identifier,
                    "[dc-04] Mirror request with a different key for a known exchange"
                );
                return Err(KeyRejection::Wrong.into());
            }
            debug!(exchange_id = %existing.id, "[dc-04] Mirror already exists");
            return Ok(existing);
        }

        let mut mirror = DataExchange::from_snapshot(snapshot);
        self.self_reference(&mut mirror);
        self.repository
            .create(&mirror)
            .map_err(Self::creation_error)?;

        info!(
            exchange_id = %mirror.id,
            identifier = %mirror.exchange_identifier,
            "[dc-04] Mirror created"
        );
        Ok(mirror)
    }

    async fn bind_chain_step(
        &self,
        id: &str,
        service: &str,
        endpoint: &str,
    ) -> Result<DataExchange, ExchangeError> {
        if endpoint.trim().is_empty() {
            return Err(ExchangeError::Validation("endpoint is required".into()));
        }
        let endpoint = normalize_endpoint(endpoint);
        let step_not_found = || ExchangeError::StepNotFound {
            service: service.to_string(),
        };

        let bound = {
            let _guard = self.locks.acquire(&Self::record_lock_key(id)).await;
            let mut exchange = self.load(id)?;
            let path = exchange
                .service_chain
                .as_ref()
                .and_then(|chain| chain.find_step(service))
                .ok_or_else(step_not_found)?;
            if let Some(step) = exchange
                .service_chain
                .as_mut()
                .and_then(|chain| chain.step_mut(&path))
            {
                step.connector = Some(endpoint.clone());
            }
            self.repository.save(&mut exchange)?;
            exchange
        };

        // No lock is held while the remote mirror is created.
        let mirror_id = if self.is_self(&endpoint) {
            bound.id.clone()
        } else {
            self.mirror_at(&endpoint, &bound.snapshot()).await?
        };

        let exchange = {
            let _guard = self.locks.acquire(&Self::record_lock_key(id)).await;
            let mut exchange = self.load(id)?;
            let path = exchange
                .service_chain
                .as_ref()
                .and_then(|chain| chain.find_step(service))
                .ok_or_else(step_not_found)?;
            let step = exchange
                .service_chain
                .as_mut()
                .and_then(|chain| chain.step_mut(&path))
                .ok_or_else(step_not_found)?;
            step.data_exchange = Some(mirror_id);
            self.repository.save(&mut exchange)?;

            info!(
                exchange_id = %exchange.id,
                service,
                endpoint = %endpoint,
                nested = path.is_nested(),
                "[dc-04] Chain step bound"
            );
            exchange
        };

        let neighbor: Vec<String> = self.neighbor(&exchange).into_iter().collect();
        self.push(&exchange, &neighbor).await?;
        Ok(exchange)
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        payload: Option<String>,
    ) -> Result<DataExchange, ExchangeError> {
        if status.trim().is_empty() {
            return Err(ExchangeError::Validation("status is required".into()));
        }

        let exchange = {
            let _guard = self.locks.acquire(&Self::record_lock_key(id)).await;
            let mut exchange = self.load(id)?;
            let previous = std::mem::replace(&mut exchange.status, status.to_string());
            if payload.is_some() {
                exchange.payload = payload;
            }
            self.repository.save(&mut exchange)?;
            info!(
                exchange_id = %exchange.id,
                "[dc-04] Status {} -> {}",
                previous,
                exchange.status
            );
            exchange
        };

        self.fan_out(exchange).await
    }

    async fn complete_service_chain_step(
        &self,
        id: &str,
        service: &str,
    ) -> Result<DataExchange, ExchangeError> {
        let exchange = {
            let _guard = self.locks.acquire(&Self::record_lock_key(id)).await;
            let mut exchange = self.load(id)?;
            let step = exchange
                .service_chain
                .as_mut()
                .and_then(|chain| {
                    let index = chain.find_top_level(service)?;
                    chain.services.get_mut(index)
                })
                .ok_or_else(|| ExchangeError::StepNotFound {
                    service: service.to_string(),
                })?;
            step.completed = true;
            self.repository.save(&mut exchange)?;
            info!(exchange_id = %exchange.id, service, "[dc-04] Chain step completed");
            exchange
        };

        self.fan_out(exchange).await
    }

    async fn sync_with_peer(&self, id: &str, endpoint: &str) -> Result<(), ExchangeError> {
        let exchange = self.load(id)?;
        self.push(&exchange, &[normalize_endpoint(endpoint)]).await
    }

    async fn apply_remote_update(
        &self,
        identifier: &str,
        presented_key: &str,
        snapshot: DataExchangeSnapshot,
    ) -> Result<DataExchange, ExchangeError> {
        if presented_key.is_empty() {
            return Err(KeyRejection::Missing.into());
        }
        let found = self
            .repository
            .find_by_index(IDENTIFIER_INDEX, identifier)?
            .filter(|ex| keys_match(&ex.exchange_key, presented_key))
            .ok_or(KeyRejection::Wrong)?;
        if snapshot.exchange_identifier != identifier {
            return Err(ExchangeError::Validation(format!(
                "exchangeIdentifier '{}' does not match '{}'",
                snapshot.exchange_identifier, identifier
            )));
        }

        let _guard = self.locks.acquire(&Self::record_lock_key(&found.id)).await;
        let mut exchange = self.load(&found.id)?;
        if !snapshot.supersedes(&exchange) {
            debug!(
                exchange_id = %exchange.id,
                local_version = exchange.version,
                remote_version = snapshot.version,
                "[dc-04] Ignoring stale update from peer"
            );
            return Ok(exchange);
        }
        exchange.apply_snapshot(snapshot);
        self.repository.replace(&exchange)?;

        info!(
            exchange_id = %exchange.id,
            status = %exchange.status,
            "[dc-04] Applied update from peer"
        );
        Ok(exchange)
    }
}
