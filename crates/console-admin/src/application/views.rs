//! Plain-text renderings of admin API results.
//!
//! Each function returns a `String` ready for stdout so that the subcommands
//! stay one-liners and the formatting can be tested without I/O.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;

use crate::domain::{
    filter_exposition, AdaptResponse, CertificateAuthority, CertificatePart, Upstream,
};

/// Pretty-prints a JSON document with two-space indentation.
pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// One card per upstream:
///
/// ```text
/// localhost:9000
///   healthy:   yes
///   requests:  3
///   fails:     0
/// ```
pub fn render_upstreams(upstreams: &[Upstream]) -> String {
    if upstreams.is_empty() {
        return "No upstreams.\n".to_string();
    }

    let mut out = String::new();
    for (i, upstream) in upstreams.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let healthy = match upstream.healthy {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        let _ = writeln!(out, "{}", upstream.address);
        let _ = writeln!(out, "  healthy:   {healthy}");
        let _ = writeln!(out, "  requests:  {}", upstream.num_requests);
        let _ = writeln!(out, "  fails:     {}", upstream.fails);
    }
    out
}

/// The exposition text, optionally restricted to series starting with
/// `filter`.
pub fn render_metrics(text: &str, filter: Option<&str>) -> String {
    match filter {
        Some(prefix) => filter_exposition(text, prefix),
        None => text.to_string(),
    }
}

/// Parsed samples as aligned `series  value` rows, sorted by series.
pub fn render_metric_table(samples: &BTreeMap<String, f64>) -> String {
    let width = samples.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for (series, value) in samples {
        let _ = writeln!(out, "{series:<width$}  {value}");
    }
    out
}

/// One card per certificate authority, followed by the requested PEM.
pub fn render_pki(authorities: &[CertificateAuthority], show: Option<CertificatePart>) -> String {
    if authorities.is_empty() {
        return "No certificate authorities configured.\n".to_string();
    }

    let mut out = String::new();
    for (i, ca) in authorities.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} ({})", ca.name, ca.id);
        let _ = writeln!(out, "  root:          {}", ca.root_common_name);
        let _ = writeln!(out, "  intermediate:  {}", ca.intermediate_common_name);
        if let Some(part) = show {
            let pem = ca.pem(part);
            out.push('\n');
            out.push_str(pem);
            if !pem.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    out
}

/// The adapted configuration, then any warnings.
pub fn render_adapt(response: &AdaptResponse) -> String {
    let mut out = render_json(&response.result);
    out.push('\n');
    if !response.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &response.warnings {
            let _ = writeln!(out, "  {warning}");
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
