//! Application layer: what the admin subcommands do, independent of HTTP.

pub mod admin_api;
pub mod pki;
pub mod views;

pub use admin_api::{AdminApi, AdminError};
pub use pki::PkiService;
