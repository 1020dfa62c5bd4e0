//! The seam between the admin views and the HTTP transport.
//!
//! # Why a trait? (for beginners)
//!
//! The PKI view needs two round trips (list CA ids, then fetch each CA).
//! Writing that logic against [`AdminApi`] instead of the concrete
//! `AdminClient` lets unit tests substitute an in-memory fake and check the
//! exact sequence of calls without starting an HTTP server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use console_core::ConfigError;

use crate::domain::{AdaptResponse, CertificateAuthority, Upstream};

/// Errors from talking to the admin endpoint.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The server answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connection refused, TLS
    /// failure, timeout).
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON we expected.
    #[error("{endpoint} returned malformed JSON: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured origin is not a usable admin URL.
    #[error("invalid admin origin: {0}")]
    InvalidOrigin(#[from] ConfigError),

    /// The HTTP client could not be constructed (e.g. no TLS backend).
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The endpoint URL could not be built from the origin.
    #[error("cannot build a URL for {endpoint} from origin {origin}")]
    InvalidEndpoint { endpoint: String, origin: String },
}

/// Operations offered by a Caddy admin endpoint.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// `GET /config/`: the full running configuration.
    async fn config(&self) -> Result<Value, AdminError>;

    /// `POST /load`: replaces the running configuration.  Returns the
    /// response body, which is usually empty.
    async fn load(&self, config: &Value) -> Result<String, AdminError>;

    /// `POST /adapt`: converts Caddyfile text to JSON without applying it.
    async fn adapt(&self, caddyfile: &str) -> Result<AdaptResponse, AdminError>;

    /// `GET /reverse_proxy/upstreams`.
    async fn upstreams(&self) -> Result<Vec<Upstream>, AdminError>;

    /// `GET /metrics`: Prometheus text exposition.
    async fn metrics(&self) -> Result<String, AdminError>;

    /// `GET /config/apps/pki/certificate_authorities`: configured CAs keyed by
    /// id.  Empty when the PKI app is not configured.
    async fn certificate_authorities(&self) -> Result<BTreeMap<String, Value>, AdminError>;

    /// `GET /pki/ca/{id}`.
    async fn certificate_authority(&self, id: &str) -> Result<CertificateAuthority, AdminError>;
}
