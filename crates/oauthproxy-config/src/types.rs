//! Configuration types mapping to the config file schema.
//!
//! ```toml
//! auth_server = "https://accounts.example.com/o/oauth2/auth"
//! token_server = "https://accounts.example.com/o/oauth2/token"
//! client_id = "real-client"
//! client_secret = "real-secret"
//! incoming_client_id = "shared-client"
//! incoming_client_secret = "shared-secret"
//! bind_address = ":53681"
//! name = "team oauth proxy"
//! ```
//!
//! JSON files may use the same keys, their `PascalCase` forms
//! (`AuthServer`, `ClientID` or `ClientId`, ...), or those forms in lowercase.

use std::net::{SocketAddr, ToSocketAddrs};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Address the proxy listens on when none is configured.
pub const DEFAULT_BIND_ADDRESS: &str = ":53681";

/// Display name used for the index page when none is configured.
pub const DEFAULT_NAME: &str = "oauth proxy";

/// Proxy configuration.
///
/// Every field is optional at parse time so that missing keys can be reported
/// together by [`ProxyConfig::validate`] rather than one parse error at a time.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Upstream authorization endpoint (`/auth` is forwarded here).
    #[serde(alias = "AuthServer", alias = "authserver")]
    pub auth_server: String,

    /// Upstream token endpoint (`/token` is forwarded here).
    #[serde(alias = "TokenServer", alias = "tokenserver")]
    pub token_server: String,

    /// Client ID presented to the upstream service.
    #[serde(alias = "ClientID", alias = "ClientId", alias = "clientid")]
    pub client_id: String,

    /// Client secret presented to the upstream service.
    #[serde(alias = "ClientSecret", alias = "clientsecret")]
    pub client_secret: String,

    /// Client ID callers must present to the proxy.
    #[serde(
        alias = "IncomingClientID",
        alias = "IncomingClientId",
        alias = "incomingclientid"
    )]
    pub incoming_client_id: String,

    /// Client secret callers must present to the proxy.
    #[serde(alias = "IncomingClientSecret", alias = "incomingclientsecret")]
    pub incoming_client_secret: String,

    /// Listen address. A leading `:` binds all interfaces.
    #[serde(alias = "BindAddress", alias = "bindaddress")]
    pub bind_address: String,

    /// Service name shown on the index page.
    #[serde(alias = "Name")]
    pub name: String,
}

impl ProxyConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Parse from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Names of the required keys that are currently empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("auth_server", &self.auth_server),
            ("token_server", &self.token_server),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("incoming_client_id", &self.incoming_client_id),
            ("incoming_client_secret", &self.incoming_client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    /// Fail if any required key is empty, without touching defaults.
    pub fn ensure_ready(&self) -> Result<()> {
        match self.missing_fields().first() {
            Some(&key) => Err(ConfigError::MissingField(key)),
            None => Ok(()),
        }
    }

    /// Check required keys and fill in defaults for the optional ones.
    ///
    /// Every missing key is logged before the error is returned so an
    /// operator sees the whole list in one run.
    pub fn validate(&mut self) -> Result<()> {
        let missing = self.missing_fields();
        for key in &missing {
            tracing::error!(key, "Config key is required");
        }

        if self.bind_address.is_empty() {
            self.bind_address = DEFAULT_BIND_ADDRESS.to_string();
        }
        if self.name.is_empty() {
            self.name = DEFAULT_NAME.to_string();
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields(missing))
        }
    }

    /// Resolve the bind address to a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let address = if self.bind_address.is_empty() {
            DEFAULT_BIND_ADDRESS
        } else {
            self.bind_address.as_str()
        };

        let candidate = match address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => address.to_string(),
        };

        candidate
            .to_socket_addrs()
            .map_err(|e| ConfigError::InvalidBindAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ConfigError::InvalidBindAddress {
                address: address.to_string(),
                reason: "no addresses resolved".to_string(),
            })
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("auth_server", &self.auth_server)
            .field("token_server", &self.token_server)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("incoming_client_id", &self.incoming_client_id)
            .field("incoming_client_secret", &redact(&self.incoming_client_secret))
            .field("bind_address", &self.bind_address)
            .field("name", &self.name)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[REDACTED]" }
}
