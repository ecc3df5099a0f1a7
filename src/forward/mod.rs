//! Backend forwarding
//!
//! Issues an equivalent request to the backend for every admitted request and
//! relays the response unchanged, including backend error statuses. Transport
//! failures map to gateway-facing upstream errors; there are no retries.

use crate::config::BackendConfig;
use crate::error::{GatewayError, Result};
use actix_web::http::header::HeaderMap;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

/// Hop-by-hop headers that must not be relayed in either direction
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Response relayed from the backend
#[derive(Debug)]
pub struct ForwardedResponse {
    /// Backend status code
    pub status: u16,
    /// Backend headers, hop-by-hop entries removed
    pub headers: Vec<(String, Vec<u8>)>,
    /// Backend body
    pub body: Bytes,
}

/// Proxies admitted requests to the backend service
pub struct Forwarder {
    client: Client,
    base_url: String,
}

impl Forwarder {
    /// Create a forwarder from the backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(GatewayError::HttpClient)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Forward one admitted request and relay the backend response
    ///
    /// The backend status and body are relayed unchanged; a transport timeout
    /// or connection failure becomes an upstream error instead.
    pub async fn forward(
        &self,
        method: &actix_web::http::Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|e| GatewayError::internal(format!("Invalid method: {}", e)))?;

        debug!("Forwarding {} {}", method, url);

        let mut request = self.client.request(method, &url).body(body);
        for (name, value) in headers {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            request = request.header(name.as_str(), value.as_bytes());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Backend timed out: {}", e);
                GatewayError::UpstreamTimeout("Backend did not respond in time".to_string())
            } else {
                warn!("Backend request failed: {}", e);
                GatewayError::Upstream("Backend unreachable".to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();
        let body = response.bytes().await.map_err(|e| {
            warn!("Failed to read backend body: {}", e);
            GatewayError::Upstream("Backend response truncated".to_string())
        })?;

        Ok(ForwardedResponse {
            status,
            headers,
            body,
        })
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}
