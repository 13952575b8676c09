//! # Domain Layer
//!
//! Exchange records, service chains and errors.

pub mod chain;
pub mod entities;
pub mod errors;

pub use chain::*;
pub use entities::*;
pub use errors::*;
