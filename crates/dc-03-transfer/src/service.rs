//! # Transfer Service
//!
//! Implements [`TransferApi`] on top of the process repository.

use crate::domain::{TransferError, TransferProcess, TransferState};
use crate::ports::inbound::{TransferApi, TransferRequest};
use async_trait::async_trait;
use dc_01_process_store::{ProcessRepository, StoreError, PROVIDER_INDEX};
use shared_types::{
    KeyedLocks, MissingIdentifier, PidGenerator, PidLookup, PidRole, ProcessKind,
    TransitionObserver,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dependencies for [`TransferService`].
pub struct TransferDependencies {
    pub repository: ProcessRepository<TransferProcess>,
    pub pid_generator: Arc<dyn PidGenerator>,
    pub locks: Arc<KeyedLocks>,
    pub observer: Arc<dyn TransitionObserver>,
}

/// Transfer process state machine.
pub struct TransferService {
    repository: ProcessRepository<TransferProcess>,
    pid_generator: Arc<dyn PidGenerator>,
    locks: Arc<KeyedLocks>,
    observer: Arc<dyn TransitionObserver>,
}

/// What a transition does when it finds the record in a given state.
enum Step {
    Apply,
    Skip,
}

impl TransferService {
    pub fn new(deps: TransferDependencies) -> Self {
        Self {
            repository: deps.repository,
            pid_generator: deps.pid_generator,
            locks: deps.locks,
            observer: deps.observer,
        }
    }

    fn resolve(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError> {
        self.repository
            .find(lookup)?
            .ok_or_else(|| TransferError::NotFound(lookup.to_string()))
    }

    async fn transition(
        &self,
        lookup: &PidLookup,
        next: TransferState,
        guard: impl Fn(TransferState) -> Step + Send,
    ) -> Result<TransferProcess, TransferError> {
        let found = self.resolve(lookup)?;
        let _lock = self
            .locks
            .acquire(&format!("{}:{}", ProcessKind::Transfer, found.id))
            .await;

        let mut tp = self
            .repository
            .get(&found.id)?
            .filter(|tp| lookup.matches(&tp.provider_pid, &tp.consumer_pid))
            .ok_or_else(|| TransferError::NotFound(lookup.to_string()))?;

        let from = tp.state;
        if let Step::Skip = guard(from) {
            debug!(
                provider_pid = %tp.provider_pid,
                "[dc-03] {} left unchanged by {}",
                from,
                next
            );
            return Ok(tp);
        }
        if !from.can_transition_to(next) {
            warn!(
                provider_pid = %tp.provider_pid,
                consumer_pid = %tp.consumer_pid,
                "[dc-03] Rejected transition {} -> {}",
                from,
                next
            );
            return Err(TransferError::InvalidTransition { from, to: next });
        }

        tp.state = next;
        self.repository.save(&mut tp)?;
        if from != next {
            self.observer.entered(ProcessKind::Transfer, next.as_str());
        }

        info!(
            provider_pid = %tp.provider_pid,
            consumer_pid = %tp.consumer_pid,
            "[dc-03] Transfer {} -> {}",
            from,
            next
        );
        Ok(tp)
    }

    fn always(_: TransferState) -> Step {
        Step::Apply
    }
}

#[async_trait]
impl TransferApi for TransferService {
    async fn get(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError> {
        self.resolve(lookup)
    }

    async fn create_from_request(
        &self,
        request: TransferRequest,
    ) -> Result<TransferProcess, TransferError> {
        if let Some(provider_pid) = request.provider_pid.filter(|p| !p.is_empty()) {
            return self.resolve(&PidLookup::Provider(provider_pid));
        }
        if request.consumer_pid.is_empty() {
            return Err(MissingIdentifier.into());
        }

        let _lock = self
            .locks
            .acquire(&format!(
                "{}:{}:{}",
                ProcessKind::Transfer,
                PidRole::Consumer,
                request.consumer_pid
            ))
            .await;

        let mut tp = TransferProcess::new(
            self.pid_generator.generate(),
            request.consumer_pid,
            request.agreement_id,
            request.format,
        );
        tp.data_address = request.data_address;
        tp.callback_address = request.callback_address;

        self.repository.create(&tp).map_err(|err| match err {
            StoreError::DuplicateIndex { index, value, .. } => TransferError::DuplicatePid {
                role: if index == PROVIDER_INDEX {
                    PidRole::Provider
                } else {
                    PidRole::Consumer
                },
                pid: value,
            },
            other => TransferError::Store(other),
        })?;
        self.observer.entered(ProcessKind::Transfer, tp.state.as_str());

        info!(
            provider_pid = %tp.provider_pid,
            consumer_pid = %tp.consumer_pid,
            agreement_id = %tp.agreement_id,
            "[dc-03] Transfer requested"
        );
        Ok(tp)
    }

    async fn start(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError> {
        // SUSPENDED is never advanced by a start message.
        self.transition(lookup, TransferState::Started, |from| match from {
            TransferState::Suspended => Step::Skip,
            _ => Step::Apply,
        })
        .await
    }

    async fn complete(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError> {
        self.transition(lookup, TransferState::Completed, Self::always)
            .await
    }

    async fn suspend(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError> {
        self.transition(lookup, TransferState::Suspended, Self::always)
            .await
    }

    async fn terminate(&self, lookup: &PidLookup) -> Result<TransferProcess, TransferError> {
        self.transition(lookup, TransferState::Terminated, |from| match from {
            TransferState::Terminated => Step::Skip,
            _ => Step::Apply,
        })
        .await
    }
}
