//! Error conversions from subsystem types.
//!
//! Store and identifier failures are server faults: they are logged here and
//! reach the caller as a bare 500.

use crate::domain::ApiError;
use dc_02_negotiation::NegotiationError;
use dc_03_transfer::TransferError;
use dc_04_data_exchange::ExchangeError;
use tracing::{error, warn};

impl From<NegotiationError> for ApiError {
    fn from(e: NegotiationError) -> Self {
        match e {
            NegotiationError::NotFound(_) => ApiError::not_found("Contract negotiation not found"),
            NegotiationError::DuplicatePid { .. }
            | NegotiationError::InvalidTransition { .. }
            | NegotiationError::EventRoleMismatch { .. } => ApiError::bad_request(e.to_string()),
            NegotiationError::MissingIdentifier(_) | NegotiationError::Store(_) => {
                error!("[dc-05] Negotiation failure: {}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::NotFound(_) => ApiError::not_found("Transfer process not found"),
            TransferError::DuplicatePid { .. } | TransferError::InvalidTransition { .. } => {
                ApiError::bad_request(e.to_string())
            }
            TransferError::MissingIdentifier(_) | TransferError::Store(_) => {
                error!("[dc-05] Transfer failure: {}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<ExchangeError> for ApiError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::NotFound(_) | ExchangeError::StepNotFound { .. } => {
                ApiError::not_found(e.to_string())
            }
            ExchangeError::Validation(_) => ApiError::bad_request(e.to_string()),
            ExchangeError::Unauthorized(rejection) => ApiError::unauthorized(rejection.to_string()),
            ExchangeError::SyncFailed { .. } => {
                warn!("[dc-05] {}", e);
                ApiError::bad_gateway(e.to_string())
            }
            ExchangeError::MirrorFailed { .. } | ExchangeError::Store(_) => {
                error!("[dc-05] Data exchange failure: {}", e);
                ApiError::internal(e.to_string())
            }
        }
    }
}
