//! Forwarded routes.

use axum::{
    extract::{Request, State},
    http::Uri,
    response::Response,
};

use crate::error::{ProxyError, Result};
use crate::forward::Route;
use crate::state::AppState;

/// Any method on `/auth`.
pub async fn auth_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    state.forwarder.forward(Route::Auth, request).await
}

/// Any method on `/token`.
pub async fn token_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    state.forwarder.forward(Route::Token, request).await
}

/// Everything else. The body is never read.
pub async fn not_found(uri: Uri) -> ProxyError {
    ProxyError::RouteNotFound(uri.path().to_string())
}
