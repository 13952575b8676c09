//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Neither a provider nor a consumer identifier was supplied where one is
/// required. This is a caller bug, not a protocol condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Either providerPid or consumerPid must be provided")]
pub struct MissingIdentifier;
