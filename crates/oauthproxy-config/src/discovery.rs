//! Config file loading.
//!
//! A config is read from one file, parsed according to its extension,
//! overlaid with secret overrides from the environment, then validated.

use std::path::{Path, PathBuf};

use crate::secrets::{ResolvedSecret, apply_env_overrides};
use crate::{ConfigError, ProxyConfig, Result};

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "oauthproxy-config.json";

/// On-disk config format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from the file extension. Anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// A validated configuration and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The validated configuration.
    pub config: ProxyConfig,
    /// File it was read from.
    pub path: PathBuf,
    /// Provenance of the client secrets.
    pub secrets: Vec<ResolvedSecret>,
}

/// Load config from a specific file path without overrides or validation.
pub fn load_config_file(path: &Path) -> Result<ProxyConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => ProxyConfig::from_json(&contents),
        ConfigFormat::Toml => ProxyConfig::from_toml(&contents),
    }
}

/// Load, apply environment overrides, and validate a config file.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    let mut config = load_config_file(path)?;
    let secrets = apply_env_overrides(&mut config);
    config.validate()?;

    for secret in &secrets {
        tracing::debug!(field = secret.field, source = %secret.source, "Resolved secret");
    }

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        secrets,
    })
}
