//! Infrastructure layer for the shell client.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `console_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`ws_client`** – Opens the `/ws/pty` WebSocket with `tokio-tungstenite`.
//!
//! - **`runner`** – The session event loop.  Waits on the in-flight connect,
//!   the open socket, the reconnect timer and the terminal event channel, feeds
//!   what happens to the bridge, and executes the commands it returns.
//!
//! - **`terminal`** – The local raw-mode terminal, the background tasks that
//!   turn keystrokes, window resizes and signals into `TerminalEvent`s, and a
//!   recording terminal for tests.

pub mod runner;
pub mod terminal;
pub mod ws_client;
