//! Credential-substituting OAuth2 reverse proxy.
//!
//! Callers talk to this proxy with a shared "incoming" client identity. The
//! proxy checks it and forwards the request to the real OAuth2 service with
//! the privileged "outgoing" identity in its place, so the real client secret
//! never has to be handed out.
//!
//! # Routes
//!
//! - `/auth` (any method) → configured authorization endpoint
//! - `/token` (any method) → configured token endpoint
//! - `/` (any method) → informational page
//! - anything else → 404
//!
//! # Components
//!
//! - [`credentials`]: Basic-Auth decoding and identity swap
//! - [`forward`]: body capping, header/query rewriting, round trip, relay
//! - [`Server`]: axum router and listener
//!
//! # Example
//!
//! ```ignore
//! use oauthproxy_server::{Server, ServerConfig};
//!
//! let loaded = oauthproxy_config::load_config(path)?;
//! let server = Server::new(
//!     loaded.config.clone(),
//!     ServerConfig::new(loaded.config.socket_addr()?),
//! )?;
//! server.run_until(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod forward;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use credentials::{
    CredentialError, CredentialTranslator, DecodeError, decode_basic_auth, encode_basic_auth,
    translate_credential,
};
pub use error::{ProxyError, Result};
pub use forward::{Forwarder, MAX_BODY_BYTES, Route};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{
    Router, middleware,
    routing::any,
};
use oauthproxy_config::ProxyConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The proxy HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server for `config`.
    ///
    /// Fails with [`ProxyError::NotReady`] when a required key is empty.
    pub fn new(config: ProxyConfig, server: ServerConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config, server)?,
        })
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(routes::index))
            .route(forward::Route::Auth.path(), any(routes::auth_handler))
            .route(forward::Route::Token.path(), any(routes::token_handler))
            .fallback(routes::not_found)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.server.bind_address
    }

    /// Run until `shutdown` resolves, returning once the server has stopped.
    pub async fn run_until(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_address()).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, name = %self.state.name(), "Starting OAuth proxy");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("OAuth proxy stopped");
        Ok(())
    }

    /// Serve in a background task, returning the bound address.
    pub async fn spawn_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.bind_address()).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, name = %self.state.name(), "Starting OAuth proxy");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, self.router())
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(addr = %local_addr, error = %e, "OAuth proxy stopped with error");
            }
        });
        Ok(local_addr)
    }
}
