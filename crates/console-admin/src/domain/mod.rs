//! Domain layer: plain data returned by the admin API.

pub mod metrics;
pub mod models;

pub use metrics::{filter_exposition, parse_metrics};
pub use models::{AdaptResponse, AdaptWarning, CertificateAuthority, CertificatePart, Upstream};
