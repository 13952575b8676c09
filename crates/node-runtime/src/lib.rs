//! # Connector Runtime Library
//!
//! Configuration loading, storage selection and subsystem wiring for the
//! connector binary. The entry point is `main.rs`.

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;

pub use container::{ConfigError, ConnectorConfig, ConnectorContainer, StorageBackend};

use anyhow::{Context, Result};
use connector_telemetry::TelemetryConfig;
use std::path::PathBuf;

/// Config file path from `--config <path>` / `--config=<path>`, else `DC_CONFIG`.
pub fn config_path<I>(args: I, env_value: Option<String>) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    env_value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// File (if any), then environment overrides, then validation.
pub fn load_config(path: Option<PathBuf>) -> Result<ConnectorConfig> {
    let mut config = match &path {
        Some(path) => ConnectorConfig::from_file(path)?,
        None => ConnectorConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate().context("Invalid connector configuration")?;
    Ok(config)
}

/// Environment telemetry settings with the file's overrides applied.
pub fn telemetry_config(config: &ConnectorConfig) -> TelemetryConfig {
    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &config.telemetry.log_level {
        telemetry.log_level = level.clone();
    }
    if let Some(json) = config.telemetry.json_logs {
        telemetry.json_logs = json;
    }
    telemetry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_path_sources() {
        assert_eq!(
            config_path(args(&["node", "--config", "a.toml"]), Some("b.toml".into())),
            Some(PathBuf::from("a.toml"))
        );
        assert_eq!(
            config_path(args(&["node", "--config=c.toml"]), None),
            Some(PathBuf::from("c.toml"))
        );
        assert_eq!(
            config_path(args(&["node"]), Some("b.toml".into())),
            Some(PathBuf::from("b.toml"))
        );
        assert_eq!(config_path(args(&["node"]), None), None);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connector]\nself_endpoint = \"https://file.example\"").unwrap();
        let config = load_config(Some(file.path().to_path_buf())).unwrap();
        // DC_SELF_ENDPOINT is not set in the test environment.
        if std::env::var("DC_SELF_ENDPOINT").is_err() {
            assert_eq!(config.connector.self_endpoint, "https://file.example");
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Some(PathBuf::from("/nonexistent/connector.toml"))).is_err());
    }

    #[test]
    fn test_telemetry_overrides() {
        let mut config = ConnectorConfig::default();
        config.telemetry.log_level = Some("debug".into());
        config.telemetry.json_logs = Some(true);
        let telemetry = telemetry_config(&config);
        assert_eq!(telemetry.log_level, "debug");
        assert!(telemetry.json_logs);
    }
}
