//! # Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transfer process state, serialized with the `dspace:` prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferState {
    #[serde(rename = "dspace:REQUESTED")]
    Requested,
    #[serde(rename = "dspace:STARTED")]
    Started,
    #[serde(rename = "dspace:SUSPENDED")]
    Suspended,
    #[serde(rename = "dspace:COMPLETED")]
    Completed,
    #[serde(rename = "dspace:TERMINATED")]
    Terminated,
}

impl TransferState {
    pub const ALL: [TransferState; 5] = [
        Self::Requested,
        Self::Started,
        Self::Suspended,
        Self::Completed,
        Self::Terminated,
    ];

    /// Check if transition is valid.
    ///
    /// COMPLETED only moves to TERMINATED; TERMINATED has no way out.
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        match self {
            Self::Terminated => false,
            Self::Completed => next == Self::Terminated,
            _ => true,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "dspace:REQUESTED",
            Self::Started => "dspace:STARTED",
            Self::Suspended => "dspace:SUSPENDED",
            Self::Completed => "dspace:COMPLETED",
            Self::Terminated => "dspace:TERMINATED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
