//! Application state shared across handlers.

use std::sync::Arc;

use oauthproxy_config::ProxyConfig;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::forward::Forwarder;

/// Application state shared across all handlers.
///
/// Everything here is immutable after startup, so cloning the state into
/// each request is just a few reference count bumps.
#[derive(Clone)]
pub struct AppState {
    /// Proxy configuration.
    pub config: Arc<ProxyConfig>,

    /// Listener settings.
    pub server: Arc<ServerConfig>,

    /// Request forwarder for `/auth` and `/token`.
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    /// Build state from a validated proxy config.
    pub fn new(config: ProxyConfig, server: ServerConfig) -> Result<Self> {
        let forwarder = Forwarder::new(&config)?;
        Ok(Self::with_forwarder(config, server, forwarder))
    }

    /// Build state around an existing forwarder.
    pub fn with_forwarder(config: ProxyConfig, server: ServerConfig, forwarder: Forwarder) -> Self {
        Self {
            config: Arc::new(config),
            server: Arc::new(server),
            forwarder: Arc::new(forwarder),
        }
    }

    /// Display name for the index page.
    pub fn name(&self) -> &str {
        &self.config.name
    }
}
