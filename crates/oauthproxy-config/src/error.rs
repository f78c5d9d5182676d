//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to parse JSON.
    #[error("failed to parse JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// A single required field is empty.
    #[error("config key '{0}' is required")]
    MissingField(&'static str),

    /// One or more required fields are empty.
    #[error("missing data in config: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The bind address could not be resolved to a socket address.
    #[error("invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },
}
