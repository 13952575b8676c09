//! # Connector Configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables. Every section has defaults, so an empty file is valid.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `DC_CONFIG` | path of the TOML file (also `--config <path>`) |
//! | `DC_HTTP_PORT` | `http.port` |
//! | `DC_SELF_ENDPOINT` | `connector.self_endpoint` |
//! | `DC_PRIVATE_TOKEN` | `connector.private_token` |
//! | `DC_DATA_DIR` | `storage.data_dir` |
//! | `DC_STORAGE_BACKEND` | `storage.backend` (`memory` or `rocksdb`) |

use dc_04_data_exchange::SyncConfig;
use dc_05_api_gateway::{GatewayConfig, HttpConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Complete connector configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub http: HttpConfig,
    pub connector: ConnectorSection,
    pub storage: StorageConfig,
    pub sync: SyncSection,
    pub telemetry: TelemetrySection,
}

/// Identity of this connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorSection {
    /// Public base URL other participants use to reach this connector.
    pub self_endpoint: String,
    /// Bearer token for the private API. Unset leaves it open.
    pub private_token: Option<String>,
}

impl Default for ConnectorSection {
    fn default() -> Self {
        Self {
            self_endpoint: "http://localhost:3000".to_string(),
            private_token: None,
        }
    }
}

/// Which key-value backend holds the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Rocksdb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::Rocksdb),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for persistent backends.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Peer synchronisation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub max_concurrent: usize,
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub base_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Bearer token presented to other participants' private API.
    pub peer_bearer_token: Option<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        Self {
            request_timeout: defaults.request_timeout,
            max_concurrent: defaults.max_concurrent,
            max_retries: defaults.max_retries,
            base_backoff: defaults.base_backoff,
            max_backoff: defaults.max_backoff,
            peer_bearer_token: None,
        }
    }
}

impl SyncSection {
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            request_timeout: self.request_timeout,
            max_concurrent: self.max_concurrent,
            max_retries: self.max_retries,
            base_backoff: self.base_backoff,
            max_backoff: self.max_backoff,
        }
    }
}

/// Overrides for the environment-driven logging setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConnectorConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Apply overrides from a variable lookup (`std::env::var` in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("DC_HTTP_PORT") {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("DC_HTTP_PORT '{}' is not a port", port)))?;
        }
        if let Some(endpoint) = lookup("DC_SELF_ENDPOINT") {
            self.connector.self_endpoint = endpoint;
        }
        if let Some(token) = lookup("DC_PRIVATE_TOKEN") {
            self.connector.private_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(dir) = lookup("DC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("DC_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.connector.self_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "connector.self_endpoint cannot be empty".into(),
            ));
        }
        if self.sync.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("sync.request_timeout cannot be 0".into()));
        }
        if self.sync.max_concurrent == 0 {
            return Err(ConfigError::Invalid("sync.max_concurrent cannot be 0".into()));
        }
        if self.sync.base_backoff > self.sync.max_backoff {
            return Err(ConfigError::Invalid(
                "sync.base_backoff cannot exceed sync.max_backoff".into(),
            ));
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            http: self.http.clone(),
            private_token: self.connector.private_token.clone(),
        }
    }
}
