//! Prometheus text exposition helpers for the metrics view.
//!
//! `GET /metrics` returns lines such as:
//!
//! ```text
//! # HELP caddy_admin_http_requests_total Counter of requests made to the Admin API's HTTP endpoints.
//! # TYPE caddy_admin_http_requests_total counter
//! caddy_admin_http_requests_total{code="200",handler="metrics",method="GET",path="/metrics"} 4
//! ```
//!
//! Comment lines start with `#` (after optional whitespace).  Every other
//! non-empty line is a series name followed by its value.

use std::collections::BTreeMap;

/// Parses an exposition into `series → value`.
///
/// Comment and blank lines are skipped, as are lines whose value is not a
/// number.  A trailing timestamp after the value is ignored.  When a series
/// appears twice the last value wins.
///
/// # Examples
///
/// ```rust
/// use console_admin::domain::parse_metrics;
///
/// let parsed = parse_metrics("# TYPE up gauge\nup 1\n");
/// assert_eq!(parsed.get("up"), Some(&1.0));
/// ```
pub fn parse_metrics(text: &str) -> BTreeMap<String, f64> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (series, rest) = split_series(line)?;
            let value = rest.split_whitespace().next()?.parse::<f64>().ok()?;
            Some((series.to_string(), value))
        })
        .collect()
}

/// Splits a sample line into its series (name plus any `{...}` label set)
/// and the remainder.  Label values are quoted and may contain spaces,
/// braces and `\"` escapes.
fn split_series(line: &str) -> Option<(&str, &str)> {
    let name_end = line.find(|c: char| c == '{' || c.is_whitespace())?;
    if !line[name_end..].starts_with('{') {
        return Some(line.split_at(name_end));
    }

    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in line[name_end..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(line.split_at(name_end + i + 1)),
            _ => {}
        }
    }
    None
}

/// Keeps only the sample lines whose series name starts with `prefix`,
/// together with the `# HELP` / `# TYPE` comments that describe them.
///
/// The returned text keeps the original line order and ends with a newline
/// when it is not empty.
pub fn filter_exposition(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        let keep = match trimmed.strip_prefix('#') {
            Some(comment) => described_metric(comment).is_some_and(|name| name.starts_with(prefix)),
            None => !trimmed.is_empty() && trimmed.starts_with(prefix),
        };
        if keep {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Returns the metric named by a `HELP` or `TYPE` comment body.
fn described_metric(comment: &str) -> Option<&str> {
    let mut fields = comment.split_whitespace();
    match fields.next()? {
        "HELP" | "TYPE" => fields.next(),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
