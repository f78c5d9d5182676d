//! Configuration for the OAuth credential proxy.
//!
//! Provides file-based configuration with:
//! - TOML (`snake_case` keys) or JSON (`PascalCase` keys also accepted)
//! - Secret overrides from environment variables
//! - Validation of the required upstream endpoints and identities
//!
//! The loaded [`ProxyConfig`] is immutable once validated and is shared
//! read-only by every request handler.

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{ConfigFormat, DEFAULT_CONFIG_FILE, LoadedConfig, load_config, load_config_file};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, apply_env_overrides, apply_overrides_with};
pub use types::{DEFAULT_BIND_ADDRESS, DEFAULT_NAME, ProxyConfig};
