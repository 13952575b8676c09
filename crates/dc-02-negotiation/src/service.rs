//! # Negotiation Service
//!
//! Implements [`NegotiationApi`] on top of the process repository.
//!
//! Every transition follows the same steps: resolve the record through the
//! caller's pid(s), take the record lock, re-read, check the transition,
//! save. Creation locks on the pid being bound so two identical requests
//! cannot both create a record.

use crate::domain::{
    ContractNegotiation, NegotiationError, NegotiationEvent, NegotiationState, TerminationDetail,
};
use crate::ports::inbound::{NegotiationApi, NegotiationOffer, NegotiationRequest};
use async_trait::async_trait;
use dc_01_process_store::{ProcessRepository, StoreError, PROVIDER_INDEX};
use shared_types::{
    KeyedLocks, MissingIdentifier, PidGenerator, PidLookup, PidRole, ProcessKind,
    TransitionObserver,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dependencies for [`NegotiationService`].
pub struct NegotiationDependencies {
    pub repository: ProcessRepository<ContractNegotiation>,
    pub pid_generator: Arc<dyn PidGenerator>,
    pub locks: Arc<KeyedLocks>,
    pub observer: Arc<dyn TransitionObserver>,
}

/// Contract negotiation state machine.
pub struct NegotiationService {
    repository: ProcessRepository<ContractNegotiation>,
    pid_generator: Arc<dyn PidGenerator>,
    locks: Arc<KeyedLocks>,
    observer: Arc<dyn TransitionObserver>,
}

impl NegotiationService {
    pub fn new(deps: NegotiationDependencies) -> Self {
        Self {
            repository: deps.repository,
            pid_generator: deps.pid_generator,
            locks: deps.locks,
            observer: deps.observer,
        }
    }

    fn record_lock_key(id: &str) -> String {
        format!("{}:{}", ProcessKind::Negotiation, id)
    }

    fn pid_lock_key(role: PidRole, pid: &str) -> String {
        format!("{}:{}:{}", ProcessKind::Negotiation, role, pid)
    }

    fn resolve(&self, lookup: &PidLookup) -> Result<ContractNegotiation, NegotiationError> {
        self.repository
            .find(lookup)?
            .ok_or_else(|| NegotiationError::NotFound(lookup.to_string()))
    }

    fn creation_error(err: StoreError) -> NegotiationError {
        match err {
            StoreError::DuplicateIndex { index, value, .. } => NegotiationError::DuplicatePid {
                role: if index == PROVIDER_INDEX {
                    PidRole::Provider
                } else {
                    PidRole::Consumer
                },
                pid: value,
            },
            other => NegotiationError::Store(other),
        }
    }

    /// Move the negotiation addressed by `lookup` to `next`.
    async fn transition(
        &self,
        lookup: &PidLookup,
        next: NegotiationState,
    ) -> Result<ContractNegotiation, NegotiationError> {
        let found = self.resolve(lookup)?;
        let _guard = self.locks.acquire(&Self::record_lock_key(&found.id)).await;

        let mut cn = self
            .repository
            .get(&found.id)?
            .filter(|cn| lookup.matches(&cn.provider_pid, &cn.consumer_pid))
            .ok_or_else(|| NegotiationError::NotFound(lookup.to_string()))?;

        let from = cn.state;
        if from == NegotiationState::Terminated && next == NegotiationState::Terminated {
            debug!(
                provider_pid = %cn.provider_pid,
                "[dc-02] Negotiation already terminated"
            );
            return Ok(cn);
        }
        if !from.can_transition_to(next) {
            warn!(
                provider_pid = %cn.provider_pid,
                consumer_pid = %cn.consumer_pid,
                "[dc-02] Rejected transition {} -> {}",
                from,
                next
            );
            return Err(NegotiationError::InvalidTransition { from, to: next });
        }

        cn.state = next;
        self.repository.save(&mut cn)?;
        if from != next {
            self.observer.entered(ProcessKind::Negotiation, next.as_str());
        }

        info!(
            provider_pid = %cn.provider_pid,
            consumer_pid = %cn.consumer_pid,
            "[dc-02] Negotiation {} -> {}",
            from,
            next
        );
        Ok(cn)
    }

    async fn create(
        &self,
        bind_role: PidRole,
        provider_pid: String,
        consumer_pid: String,
        state: NegotiationState,
        callback_address: Option<String>,
    ) -> Result<ContractNegotiation, NegotiationError> {
        let bound_pid = match bind_role {
            PidRole::Provider => &provider_pid,
            PidRole::Consumer => &consumer_pid,
        };
        let _guard = self
            .locks
            .acquire(&Self::pid_lock_key(bind_role, bound_pid))
            .await;

        let cn = ContractNegotiation::new(provider_pid, consumer_pid, state, callback_address);
        self.repository.create(&cn).map_err(Self::creation_error)?;
        self.observer.entered(ProcessKind::Negotiation, cn.state.as_str());

        info!(
            provider_pid = %cn.provider_pid,
            consumer_pid = %cn.consumer_pid,
            "[dc-02] Negotiation created in {}",
            cn.state
        );
        Ok(cn)
    }
}

#[async_trait]
impl NegotiationApi for NegotiationService {
    async fn get(&self, lookup: &PidLookup) -> Result<ContractNegotiation, NegotiationError> {
        self.resolve(lookup)
    }

    async fn create_from_request(
        &self,
        request: NegotiationRequest,
    ) -> Result<ContractNegotiation, NegotiationError> {
        if let Some(provider_pid) = request.provider_pid.filter(|p| !p.is_empty()) {
            return self.resolve(&PidLookup::Provider(provider_pid));
        }
        if request.consumer_pid.is_empty() {
            return Err(MissingIdentifier.into());
        }

        let provider_pid = self.pid_generator.generate();
        self.create(
            PidRole::Consumer,
            provider_pid,
            request.consumer_pid,
            NegotiationState::Requested,
            request.callback_address,
        )
        .await
    }

    async fn create_from_offer(
        &self,
        offer: NegotiationOffer,
    ) -> Result<ContractNegotiation, NegotiationError> {
        let provider_pid = offer
            .provider_pid
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.pid_generator.generate());
        let consumer_pid = self.pid_generator.generate();

        self.create(
            PidRole::Provider,
            provider_pid,
            consumer_pid,
            NegotiationState::Offered,
            offer.callback_address,
        )
        .await
    }

    async fn accept_offer_as_request(
        &self,
        lookup: &PidLookup,
    ) -> Result<ContractNegotiation, NegotiationError> {
        self.transition(lookup, NegotiationState::Offered).await
    }

    async fn apply_event(
        &self,
        path_role: PidRole,
        lookup: &PidLookup,
        event: NegotiationEvent,
    ) -> Result<ContractNegotiation, NegotiationError> {
        if event.receiving_role() != path_role {
            return Err(NegotiationError::EventRoleMismatch {
                event,
                role: path_role,
            });
        }
        self.transition(lookup, event.target_state()).await
    }

    async fn record_agreement(
        &self,
        lookup: &PidLookup,
    ) -> Result<ContractNegotiation, NegotiationError> {
        // The agreement's originator is taken on trust.
        debug!("[dc-02] Recording agreement for {} without originator check", lookup);
        self.transition(lookup, NegotiationState::Agreed).await
    }

    async fn verify_agreement(
        &self,
        provider_pid: &str,
    ) -> Result<ContractNegotiation, NegotiationError> {
        let lookup = PidLookup::from_parts(Some(provider_pid), None)?;
        self.transition(&lookup, NegotiationState::Verified).await
    }

    async fn terminate(
        &self,
        lookup: &PidLookup,
        detail: TerminationDetail,
    ) -> Result<ContractNegotiation, NegotiationError> {
        if detail.code.is_some() || !detail.reasons.is_empty() {
            info!(
                code = ?detail.code,
                reasons = detail.reasons.len(),
                "[dc-02] Termination requested for {}",
                lookup
            );
        }
        self.transition(lookup, NegotiationState::Terminated).await
    }
}
