//! # Ports Layer
//!
//! Driven ports of the process store.

pub mod outbound;

pub use outbound::*;
