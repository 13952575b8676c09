//! # Dual-Key Resolution
//!
//! A process is resolved by its provider id, its consumer id, or both.
//! With both, the stored pair must match exactly; this guards against a peer
//! reusing one half of the pair across processes.

use crate::errors::MissingIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side minted an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidRole {
    /// Identifier assigned by the provider.
    Provider,
    /// Identifier assigned by the consumer.
    Consumer,
}

impl PidRole {
    /// The opposite side.
    pub fn counterpart(&self) -> PidRole {
        match self {
            PidRole::Provider => PidRole::Consumer,
            PidRole::Consumer => PidRole::Provider,
        }
    }
}

impl fmt::Display for PidRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidRole::Provider => f.write_str("provider"),
            PidRole::Consumer => f.write_str("consumer"),
        }
    }
}

/// How a caller identifies the process it means.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PidLookup {
    /// Provider id only.
    Provider(String),
    /// Consumer id only.
    Consumer(String),
    /// Both halves; the stored pair must match both.
    Both {
        /// Provider-side id.
        provider: String,
        /// Consumer-side id.
        consumer: String,
    },
}

impl PidLookup {
    /// Build a lookup from whichever halves are present.
    ///
    /// Empty strings count as absent. Fails when neither half is present.
    pub fn from_parts(
        provider: Option<&str>,
        consumer: Option<&str>,
    ) -> Result<Self, MissingIdentifier> {
        let provider = provider.filter(|p| !p.is_empty());
        let consumer = consumer.filter(|c| !c.is_empty());
        match (provider, consumer) {
            (Some(p), Some(c)) => Ok(PidLookup::Both {
                provider: p.to_string(),
                consumer: c.to_string(),
            }),
            (Some(p), None) => Ok(PidLookup::Provider(p.to_string())),
            (None, Some(c)) => Ok(PidLookup::Consumer(c.to_string())),
            (None, None) => Err(MissingIdentifier),
        }
    }

    /// Lookup for an id taken from a request path, paired with the
    /// counterpart id carried in the message body.
    pub fn from_path(role: PidRole, path_pid: &str, body_counterpart: Option<&str>) -> Self {
        match role {
            PidRole::Provider => match body_counterpart {
                Some(consumer) => PidLookup::Both {
                    provider: path_pid.to_string(),
                    consumer: consumer.to_string(),
                },
                None => PidLookup::Provider(path_pid.to_string()),
            },
            PidRole::Consumer => match body_counterpart {
                Some(provider) => PidLookup::Both {
                    provider: provider.to_string(),
                    consumer: path_pid.to_string(),
                },
                None => PidLookup::Consumer(path_pid.to_string()),
            },
        }
    }

    /// Provider half, if part of the lookup.
    pub fn provider(&self) -> Option<&str> {
        match self {
            PidLookup::Provider(p) | PidLookup::Both { provider: p, .. } => Some(p),
            PidLookup::Consumer(_) => None,
        }
    }

    /// Consumer half, if part of the lookup.
    pub fn consumer(&self) -> Option<&str> {
        match self {
            PidLookup::Consumer(c) | PidLookup::Both { consumer: c, .. } => Some(c),
            PidLookup::Provider(_) => None,
        }
    }

    /// Whether a stored `(provider, consumer)` pair satisfies this lookup.
    pub fn matches(&self, provider_pid: &str, consumer_pid: &str) -> bool {
        match self {
            PidLookup::Provider(p) => p == provider_pid,
            PidLookup::Consumer(c) => c == consumer_pid,
            PidLookup::Both { provider, consumer } => {
                provider == provider_pid && consumer == consumer_pid
            }
        }
    }
}

impl fmt::Display for PidLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidLookup::Provider(p) => write!(f, "providerPid={}", p),
            PidLookup::Consumer(c) => write!(f, "consumerPid={}", c),
            PidLookup::Both { provider, consumer } => {
                write!(f, "providerPid={}, consumerPid={}", provider, consumer)
            }
        }
    }
}
