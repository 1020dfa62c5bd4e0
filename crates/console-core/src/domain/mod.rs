//! Domain layer: terminal-session state and reconnect policy.
//!
//! Everything here is plain data plus pure functions.  The shell client's
//! bridge drives these types; nothing in this module performs I/O or reads the
//! clock.

pub mod reconnect;
pub mod session;

pub use reconnect::{PolicyError, ReconnectPolicy};
pub use session::{SessionState, SizeError, TerminalSize};
