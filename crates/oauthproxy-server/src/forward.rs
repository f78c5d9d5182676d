//! Request forwarding to the upstream OAuth2 endpoints.
//!
//! One inbound request becomes exactly one outbound request:
//!
//! 1. read at most [`MAX_BODY_BYTES`] of the body
//! 2. swap the Basic-Auth identity, if an Authorization header is present
//! 3. swap the `client_id` query parameter, if present
//! 4. send to the upstream URL for the route
//! 5. relay status, headers and body back unchanged
//!
//! Any failure aborts the request immediately; nothing is retried.

use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::Response,
};
use futures::{StreamExt, TryStreamExt};
use oauthproxy_config::ProxyConfig;
use reqwest::Client;
use url::Url;

use crate::credentials::{CredentialTranslator, DecodeError};
use crate::error::{ProxyError, Result};

/// Largest inbound body forwarded upstream. Anything past this is dropped.
pub const MAX_BODY_BYTES: usize = 16384;

/// Query parameter carrying the OAuth client ID.
pub const CLIENT_ID_PARAM: &str = "client_id";

/// Connection-level headers that describe a single hop and are never relayed.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// The two forwarded routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/auth`, forwarded to the authorization endpoint.
    Auth,
    /// `/token`, forwarded to the token endpoint.
    Token,
}

impl Route {
    /// Inbound path for this route.
    pub fn path(self) -> &'static str {
        match self {
            Route::Auth => "/auth",
            Route::Token => "/token",
        }
    }
}

/// Forwards requests for the two routes to the configured upstream service.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
    translator: CredentialTranslator,
    incoming_client_id: String,
    outgoing_client_id: String,
    auth_server: String,
    token_server: String,
}

impl Forwarder {
    /// Create a forwarder with a default HTTP client.
    ///
    /// Fails if any required config key is empty, so a blank identity can
    /// never be substituted.
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        Self::with_client(config, Client::new())
    }

    /// Create a forwarder using an existing HTTP client.
    pub fn with_client(config: &ProxyConfig, client: Client) -> Result<Self> {
        config.ensure_ready()?;

        Ok(Self {
            client,
            translator: CredentialTranslator::from_config(config),
            incoming_client_id: config.incoming_client_id.clone(),
            outgoing_client_id: config.client_id.clone(),
            auth_server: config.auth_server.clone(),
            token_server: config.token_server.clone(),
        })
    }

    /// Upstream URL configured for `route`.
    pub fn upstream_url(&self, route: Route) -> &str {
        match route {
            Route::Auth => &self.auth_server,
            Route::Token => &self.token_server,
        }
    }

    /// Forward one request and relay the upstream response.
    pub async fn forward(&self, route: Route, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();

        let body = read_capped_body(body, MAX_BODY_BYTES).await?;

        let headers = prepare_headers(&parts.headers, &self.translator)?;

        let query = rewrite_query(
            parts.uri.query(),
            &self.incoming_client_id,
            &self.outgoing_client_id,
        )?;

        let url = build_upstream_url(self.upstream_url(route), query.as_deref())?;

        tracing::debug!(
            method = %parts.method,
            route = route.path(),
            upstream = %redact_query(&url),
            body_bytes = body.len(),
            "Forwarding request"
        );

        let mut outbound = self.client.request(parts.method, url).headers(headers);
        if !body.is_empty() {
            outbound = outbound.body(body);
        }
        let outbound = outbound
            .build()
            .map_err(|e| ProxyError::OutboundConstruction(e.to_string()))?;

        let upstream = self
            .client
            .execute(outbound)
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;

        relay_response(upstream)
    }
}

/// Read up to `limit` bytes of `body`. Bytes past the limit are discarded
/// without error.
pub async fn read_capped_body(body: Body, limit: usize) -> Result<Vec<u8>> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProxyError::BodyRead(e.to_string()))?;
        let remaining = limit - buf.len();
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            if chunk.len() > remaining {
                tracing::debug!(limit, "Request body truncated");
            }
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

/// Clone the inbound headers and make them fit for the outbound request.
///
/// The Authorization header, when present, is swapped through `translator`;
/// a translation failure means the original header is never forwarded.
/// `Host`, `Content-Length` and hop-by-hop headers are dropped; the client
/// derives them from the outbound URL and the bytes actually sent, so an
/// empty body goes out with no `Content-Length` at all.
pub fn prepare_headers(inbound: &HeaderMap, translator: &CredentialTranslator) -> Result<HeaderMap> {
    let mut headers = inbound.clone();

    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }

    let authorization = headers.remove(header::AUTHORIZATION);
    if let Some(value) = authorization.filter(|v| !v.is_empty()) {
        let value = value
            .to_str()
            .map_err(|_| ProxyError::CredentialDecoding(DecodeError::InvalidScheme))?;
        let translated = translator.translate(value)?;
        let translated = HeaderValue::from_str(&translated)
            .map_err(|e| ProxyError::OutboundConstruction(e.to_string()))?;
        headers.insert(header::AUTHORIZATION, translated);
    }

    Ok(headers)
}

/// Check and replace the `client_id` parameter, then re-encode the query.
///
/// Keys come out sorted; the values of a repeated key keep their order.
/// Returns `None` when there is nothing to encode.
pub fn rewrite_query(
    raw_query: Option<&str>,
    incoming_client_id: &str,
    outgoing_client_id: &str,
) -> Result<Option<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(raw_query.unwrap_or("").as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    if let Some(values) = params.get_mut(CLIENT_ID_PARAM)
        && values.iter().any(|v| !v.is_empty())
    {
        if values
            .iter()
            .filter(|v| !v.is_empty())
            .any(|v| v != incoming_client_id)
        {
            return Err(ProxyError::ClientIdMismatch);
        }
        *values = vec![outgoing_client_id.to_string()];
    }

    if params.is_empty() {
        return Ok(None);
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, values) in &params {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    Ok(Some(serializer.finish()))
}

/// Combine the configured upstream URL with the rewritten query.
pub fn build_upstream_url(upstream: &str, query: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(upstream).map_err(|e| ProxyError::UpstreamUrl {
        url: upstream.to_string(),
        reason: e.to_string(),
    })?;
    url.set_query(query);
    Ok(url)
}

/// Turn the upstream response into the response for the caller.
///
/// Headers are copied first (every occurrence, in order), then the status,
/// then the body is streamed through without a size limit.
pub fn relay_response(upstream: reqwest::Response) -> Result<Response> {
    let status = upstream.status();

    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    let stream = upstream
        .bytes_stream()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to relay response body"))
        .map_err(std::io::Error::other);

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(stream))
        .map_err(|e| ProxyError::ResponseRelay(e.to_string()))?;
    *response.headers_mut() = headers;

    Ok(response)
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Render a URL for logs with query values hidden.
fn redact_query(url: &Url) -> String {
    let mut shown = url.clone();
    if url.query().is_some() {
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for key in &keys {
            serializer.append_pair(key, "***");
        }
        shown.set_query(Some(&serializer.finish()));
    }
    shown.to_string()
}
