//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `upstream.client_id`.
pub const CLIENT_ID_ENV: &str = "API_PROXY_CLIENT_ID";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// `API_PROXY_CLIENT_ID`, when set, replaces the file's client ID.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ProxyConfig = toml::from_str(&content)?;
    apply_client_id_override(&mut config, std::env::var(CLIENT_ID_ENV).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults plus environment overrides, validated.
pub fn load_default_config() -> Result<ProxyConfig, ConfigError> {
    let mut config = ProxyConfig::default();
    apply_client_id_override(&mut config, std::env::var(CLIENT_ID_ENV).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Replace the client ID if a non-empty override is given.
pub fn apply_client_id_override(config: &mut ProxyConfig, client_id: Option<String>) {
    if let Some(client_id) = client_id.filter(|id| !id.trim().is_empty()) {
        config.upstream.client_id = client_id;
    }
}
