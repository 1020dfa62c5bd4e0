//! Payloads returned by the Caddy admin API.
//!
//! Every field the admin UI displays has a serde default so that a server
//! running an older or newer Caddy (which may add or drop fields) still
//! deserialises cleanly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Upstreams ─────────────────────────────────────────────────────────────────

/// One reverse-proxy upstream as reported by `GET /reverse_proxy/upstreams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    /// Dial address, e.g. `"10.0.0.5:8080"`.
    pub address: String,

    /// Health flag.  Recent Caddy versions omit it, so `None` means "not
    /// reported" rather than "unhealthy".
    #[serde(default)]
    pub healthy: Option<bool>,

    /// Requests currently in flight to this upstream.
    #[serde(default)]
    pub num_requests: i64,

    /// Recent failed requests counted by passive health checks.
    #[serde(default)]
    pub fails: i64,
}

// ── PKI ───────────────────────────────────────────────────────────────────────

/// A certificate authority descriptor from `GET /pki/ca/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateAuthority {
    pub id: String,
    pub name: String,
    pub root_common_name: String,
    pub intermediate_common_name: String,
    /// PEM-encoded root certificate.
    pub root_certificate: String,
    /// PEM-encoded intermediate certificate.
    pub intermediate_certificate: String,
}

/// Which certificate of a CA to print in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificatePart {
    Root,
    Intermediate,
}

impl CertificateAuthority {
    /// Returns the PEM text of the requested certificate.
    pub fn pem(&self, part: CertificatePart) -> &str {
        match part {
            CertificatePart::Root => &self.root_certificate,
            CertificatePart::Intermediate => &self.intermediate_certificate,
        }
    }
}

impl fmt::Display for CertificatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificatePart::Root => f.write_str("root"),
            CertificatePart::Intermediate => f.write_str("intermediate"),
        }
    }
}

impl FromStr for CertificatePart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "root" => Ok(CertificatePart::Root),
            "intermediate" => Ok(CertificatePart::Intermediate),
            other => Err(format!(
                "unknown certificate {other:?}; expected \"root\" or \"intermediate\""
            )),
        }
    }
}

// ── Caddyfile adapter ─────────────────────────────────────────────────────────

/// Response of `POST /adapt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptResponse {
    /// The adapted JSON configuration.
    #[serde(default)]
    pub result: Value,

    /// Non-fatal problems the adapter noticed.
    #[serde(default)]
    pub warnings: Vec<AdaptWarning>,
}

/// A single adapter warning, e.g. an unused directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptWarning {
    pub file: String,
    pub line: u32,
    pub directive: String,
    pub message: String,
}

impl fmt::Display for AdaptWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.file.is_empty() {
            write!(f, "{}:{}: ", self.file, self.line)?;
        }
        if !self.directive.is_empty() {
            write!(f, "{}: ", self.directive)?;
        }
        f.write_str(&self.message)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_with_health_flag() {
        // Arrange
        let body = json!({
            "address": "localhost:9000",
            "healthy": true,
            "num_requests": 3,
            "fails": 1
        });

        // Act
        let upstream: Upstream = serde_json::from_value(body).unwrap();

        // Assert
        assert_eq!(
            upstream,
            Upstream {
                address: "localhost:9000".to_string(),
                healthy: Some(true),
                num_requests: 3,
                fails: 1,
            }
        );
    }

    #[test]
    fn test_upstream_without_health_flag_is_unknown() {
        let upstream: Upstream =
            serde_json::from_value(json!({ "address": "10.0.0.1:80", "num_requests": 0, "fails": 0 }))
                .unwrap();

        assert_eq!(upstream.healthy, None);
    }

    #[test]
    fn test_certificate_authority_tolerates_missing_fields() {
        let ca: CertificateAuthority =
            serde_json::from_value(json!({ "id": "local", "name": "Caddy Local Authority" }))
                .unwrap();

        assert_eq!(ca.id, "local");
        assert_eq!(ca.name, "Caddy Local Authority");
        assert!(ca.root_certificate.is_empty());
    }

    #[test]
    fn test_pem_selects_requested_certificate() {
        let ca = CertificateAuthority {
            root_certificate: "ROOT".to_string(),
            intermediate_certificate: "INTER".to_string(),
            ..Default::default()
        };

        assert_eq!(ca.pem(CertificatePart::Root), "ROOT");
        assert_eq!(ca.pem(CertificatePart::Intermediate), "INTER");
    }

    #[test]
    fn test_certificate_part_parses_case_insensitively() {
        assert_eq!("Root".parse::<CertificatePart>(), Ok(CertificatePart::Root));
        assert_eq!(
            "intermediate".parse::<CertificatePart>(),
            Ok(CertificatePart::Intermediate)
        );
        assert!("leaf".parse::<CertificatePart>().is_err());
    }

    #[test]
    fn test_adapt_response_with_warnings() {
        // Arrange
        let body = json!({
            "result": { "apps": {} },
            "warnings": [
                { "file": "Caddyfile", "line": 3, "directive": "tls", "message": "unused" }
            ]
        });

        // Act
        let response: AdaptResponse = serde_json::from_value(body).unwrap();

        // Assert
        assert_eq!(response.result, json!({ "apps": {} }));
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.warnings[0].to_string(), "Caddyfile:3: tls: unused");
    }

    #[test]
    fn test_adapt_response_without_warnings() {
        let response: AdaptResponse = serde_json::from_value(json!({ "result": {} })).unwrap();

        assert!(response.warnings.is_empty());
    }

    #[test]
    fn test_warning_display_with_message_only() {
        let warning = AdaptWarning {
            message: "something odd".to_string(),
            ..Default::default()
        };

        assert_eq!(warning.to_string(), "something odd");
    }
}
