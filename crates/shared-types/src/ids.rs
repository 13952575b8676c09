//! # Identifier Generation
//!
//! Process identifiers minted by this connector are `urn:uuid:` followed by a
//! random (v4) UUID. The prefix only signals local origin; peers treat the
//! whole string as opaque.

use uuid::Uuid;

/// Prefix of every locally minted identifier.
pub const PID_PREFIX: &str = "urn:uuid:";

/// Source of fresh process identifiers.
///
/// Injected into the state-machine services so tests can pin the values.
pub trait PidGenerator: Send + Sync {
    /// Produce a new, globally unique identifier.
    fn generate(&self) -> String;
}

/// Default generator backed by random UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UrnUuidGenerator;

impl PidGenerator for UrnUuidGenerator {
    fn generate(&self) -> String {
        generate_pid()
    }
}

/// Mint a new `urn:uuid:` identifier.
pub fn generate_pid() -> String {
    format!("{}{}", PID_PREFIX, Uuid::new_v4())
}

/// Whether `pid` has the shape produced by [`generate_pid`].
pub fn is_generated_pid(pid: &str) -> bool {
    pid.strip_prefix(PID_PREFIX)
        .map(|rest| Uuid::parse_str(rest).is_ok())
        .unwrap_or(false)
}
