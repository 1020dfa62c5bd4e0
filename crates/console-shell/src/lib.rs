//! console-shell library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does console-shell do? (for beginners)
//!
//! The Caddy admin UI includes a web terminal: a page that opens a WebSocket
//! to `/ws/pty` on the admin endpoint and shows a shell running on the server.
//! `console-shell` is the same thing for a native terminal.  It:
//!
//! 1. Puts the local terminal into raw mode so every keystroke is forwarded.
//! 2. Connects to `ws://<admin origin>/ws/pty`.
//! 3. Tells the server the local terminal size with a 5-byte resize frame.
//! 4. Sends keystrokes as base64 text frames and writes server output back to
//!    the local terminal.
//! 5. Reconnects automatically (every 3 seconds by default) when the socket
//!    closes, until the user detaches with `Ctrl+]`.
//!
//! The decision logic lives in [`application::bridge::TerminalBridge`], a
//! state machine with no I/O.  [`infrastructure::runner::run_session`] is the
//! event loop that feeds it socket, timer and keyboard events and carries out
//! the commands it returns.

/// Application layer: the terminal bridge state machine and its seams.
pub mod application;

/// Infrastructure layer: WebSocket connector, session runner, local terminal.
pub mod infrastructure;
