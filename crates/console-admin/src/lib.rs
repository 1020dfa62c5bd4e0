//! console-admin library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does console-admin do? (for beginners)
//!
//! Caddy exposes a management API on its admin endpoint (by default
//! `http://localhost:2019`).  The admin UI is a set of pages that each call
//! one or two of those endpoints and display the answer.  `console-admin`
//! provides the same views as subcommands:
//!
//! | Subcommand   | Endpoint(s)                                              |
//! |--------------|----------------------------------------------------------|
//! | `config`     | `GET /config/`                                           |
//! | `load`       | `POST /load`                                             |
//! | `adapt`      | `POST /adapt`                                            |
//! | `upstreams`  | `GET /reverse_proxy/upstreams`                           |
//! | `metrics`    | `GET /metrics`                                           |
//! | `pki`        | `GET /config/apps/pki/certificate_authorities`, then `GET /pki/ca/{id}` per CA |
//!
//! Unlike the web pages, every failure (connection refused, non-2xx status,
//! malformed JSON) is reported on stderr with a non-zero exit code.

/// Domain layer: admin API payload types and metrics parsing.
pub mod domain;

/// Application layer: the admin API seam, PKI aggregation, text views.
pub mod application;

/// Infrastructure layer: the reqwest-based admin client.
pub mod infrastructure;
