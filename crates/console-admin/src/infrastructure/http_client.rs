//! reqwest-based [`AdminApi`] implementation.
//!
//! # Request flow (for beginners)
//!
//! Every call goes through the same three steps:
//!
//! 1. Build the endpoint URL from the configured origin.
//! 2. Send the request and read the whole body as text.
//! 3. Turn a non-2xx status into [`AdminError::Status`] (keeping the body,
//!    which Caddy fills with a JSON `{"error": "..."}` explanation), otherwise
//!    decode the text.
//!
//! Bodies are decoded with `serde_json` directly rather than
//! `Response::json` so that malformed JSON is reported as
//! [`AdminError::Decode`] with the endpoint that produced it.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use console_core::config::ServerConfig;

use crate::application::admin_api::{AdminApi, AdminError};
use crate::domain::{AdaptResponse, CertificateAuthority, Upstream};

const CONFIG_PATH: &str = "/config/";
const LOAD_PATH: &str = "/load";
const ADAPT_PATH: &str = "/adapt";
const UPSTREAMS_PATH: &str = "/reverse_proxy/upstreams";
const METRICS_PATH: &str = "/metrics";
const CERTIFICATE_AUTHORITIES_PATH: &str = "/config/apps/pki/certificate_authorities";

/// Time allowed to establish the TCP (and TLS) connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for a whole request, including reading the body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one Caddy admin origin.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    origin: Url,
}

impl AdminClient {
    /// Creates a client for `origin` with the default timeouts.  A `ws`/`wss`
    /// origin is treated as `http`/`https`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Client`] if the HTTP client cannot be built.
    pub fn new(origin: Url) -> Result<Self, AdminError> {
        Self::with_timeouts(origin, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client that gives up connecting after `connect` and on a
    /// whole request (connect, send, read body) after `request`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Client`] if the HTTP client cannot be built.
    pub fn with_timeouts(
        mut origin: Url,
        connect: Duration,
        request: Duration,
    ) -> Result<Self, AdminError> {
        let http_scheme = match origin.scheme() {
            "ws" => Some("http"),
            "wss" => Some("https"),
            _ => None,
        };
        if let Some(scheme) = http_scheme {
            let _ = origin.set_scheme(scheme);
        }

        let http = Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .build()
            .map_err(AdminError::Client)?;
        Ok(Self { http, origin })
    }

    /// Creates a client for the origin in `[server]`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidOrigin`] if the origin is unusable.
    pub fn from_config(server: &ServerConfig) -> Result<Self, AdminError> {
        Self::new(server.origin_url()?)
    }

    /// The origin every endpoint is resolved against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Builds an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AdminError> {
        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| AdminError::InvalidEndpoint {
                endpoint: format!("/{}", segments.join("/")),
                origin: self.origin.to_string(),
            })?
            .clear()
            .extend(segments);
        Ok(url)
    }

    /// Builds the URL of a fixed, already-encoded path such as `/config/`.
    fn fixed(&self, path: &str) -> Url {
        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.set_path(path);
        url
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<String, AdminError> {
        let request_error = |source| AdminError::Request {
            endpoint: endpoint.to_string(),
            source,
        };

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "admin response");

        if !status.is_success() {
            return Err(AdminError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }

    async fn get_text(&self, path: &str) -> Result<String, AdminError> {
        self.send(path, self.http.get(self.fixed(path))).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AdminError> {
        let body = self.get_text(path).await?;
        decode(path, &body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, AdminError> {
    serde_json::from_str(body).map_err(|source| AdminError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn config(&self) -> Result<Value, AdminError> {
        self.get_json(CONFIG_PATH).await
    }

    async fn load(&self, config: &Value) -> Result<String, AdminError> {
        let request = self.http.post(self.fixed(LOAD_PATH)).json(config);
        self.send(LOAD_PATH, request).await
    }

    async fn adapt(&self, caddyfile: &str) -> Result<AdaptResponse, AdminError> {
        let request = self
            .http
            .post(self.fixed(ADAPT_PATH))
            .header(CONTENT_TYPE, "text/caddyfile")
            .body(caddyfile.to_string());
        let body = self.send(ADAPT_PATH, request).await?;
        decode(ADAPT_PATH, &body)
    }

    async fn upstreams(&self) -> Result<Vec<Upstream>, AdminError> {
        let upstreams: Option<Vec<Upstream>> = self.get_json(UPSTREAMS_PATH).await?;
        Ok(upstreams.unwrap_or_default())
    }

    async fn metrics(&self) -> Result<String, AdminError> {
        self.get_text(METRICS_PATH).await
    }

    async fn certificate_authorities(&self) -> Result<BTreeMap<String, Value>, AdminError> {
        // Caddy answers `null` for a config path that does not exist.
        let authorities: Option<BTreeMap<String, Value>> =
            self.get_json(CERTIFICATE_AUTHORITIES_PATH).await?;
        Ok(authorities.unwrap_or_default())
    }

    async fn certificate_authority(&self, id: &str) -> Result<CertificateAuthority, AdminError> {
        let url = self.endpoint(&["pki", "ca", id])?;
        let endpoint = url.path().to_string();
        let body = self.send(&endpoint, self.http.get(url)).await?;
        decode(&endpoint, &body)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
