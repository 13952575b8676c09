//! # Domain Layer
//!
//! Record traits and error types of the process store.

pub mod errors;
pub mod record;

pub use errors::*;
pub use record::*;
