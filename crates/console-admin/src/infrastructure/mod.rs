//! Infrastructure layer: HTTP transport for the admin API.

pub mod http_client;

pub use http_client::AdminClient;
