//! Secret overrides from the environment.
//!
//! Resolution order for each client secret:
//! 1. Environment variable (when set and non-empty)
//! 2. Config file value
//!
//! Keeping secrets out of the config file lets the file itself be checked in
//! or mounted from a less protected location.

use crate::ProxyConfig;

/// Environment variable overriding `client_secret`.
pub const CLIENT_SECRET_ENV: &str = "OAUTHPROXY_CLIENT_SECRET";

/// Environment variable overriding `incoming_client_secret`.
pub const INCOMING_CLIENT_SECRET_ENV: &str = "OAUTHPROXY_INCOMING_CLIENT_SECRET";

/// Where a secret was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Provenance of one secret field after overrides were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// Config key the secret belongs to.
    pub field: &'static str,
    /// Where the value in effect came from.
    pub source: SecretSource,
}

/// Apply secret overrides from the process environment.
pub fn apply_env_overrides(config: &mut ProxyConfig) -> Vec<ResolvedSecret> {
    apply_overrides_with(config, |var| std::env::var(var).ok())
}

/// Apply secret overrides using `lookup` to read variables.
pub fn apply_overrides_with(
    config: &mut ProxyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<ResolvedSecret> {
    let slots = [
        ("client_secret", CLIENT_SECRET_ENV, &mut config.client_secret),
        (
            "incoming_client_secret",
            INCOMING_CLIENT_SECRET_ENV,
            &mut config.incoming_client_secret,
        ),
    ];

    let mut resolved = Vec::with_capacity(slots.len());
    for (field, env_var, slot) in slots {
        match lookup(env_var).filter(|v| !v.is_empty()) {
            Some(value) => {
                *slot = value;
                resolved.push(ResolvedSecret {
                    field,
                    source: SecretSource::EnvVar(env_var.to_string()),
                });
            }
            None if !slot.is_empty() => resolved.push(ResolvedSecret {
                field,
                source: SecretSource::ConfigFile,
            }),
            None => {}
        }
    }
    resolved
}
