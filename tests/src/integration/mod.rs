//! Integration flows across subsystems and connectors.

pub mod contract_lifecycle;
pub mod exchange_sync;
