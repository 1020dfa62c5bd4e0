//! # console-core
//!
//! Shared library for Caddy Console containing the PTY frame codec, the
//! terminal-session domain types, and the on-disk configuration schema.
//!
//! This crate is used by both the interactive shell client and the admin CLI.
//! It opens no sockets and never touches the terminal.
//!
//! # Architecture overview (for beginners)
//!
//! Caddy Console is a native console for a Caddy server running the admin UI
//! module.  The server exposes a management HTTP API plus a WebSocket at
//! `/ws/pty` that is attached to a shell running on the server.
//!
//! This crate (`console-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the `/ws/pty` WebSocket.  Keystrokes
//!   go out as base64 text frames, terminal size changes go out as a 5-byte
//!   binary control frame, and shell output comes back as either raw binary or
//!   base64 text.
//!
//! - **`domain`** – Pure session state: the terminal size, the connection
//!   state machine states, and the reconnect policy that decides how long to
//!   wait between attempts.
//!
//! - **`config`** – The `console.toml` schema shared by both binaries, plus
//!   helpers to locate, load, and save it.

pub mod config;
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `console_core::TerminalSize` instead of `console_core::domain::session::TerminalSize`.
pub use config::{ConfigError, ConsoleConfig};
pub use domain::reconnect::{PolicyError, ReconnectPolicy};
pub use domain::session::{SessionState, SizeError, TerminalSize};
pub use protocol::frame::{
    decode_output, decode_resize, encode_input, encode_resize, FrameError, OutgoingFrame,
    OutputPayload, TerminalOutput,
};
