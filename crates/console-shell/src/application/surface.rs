//! Seams between the bridge and the terminal the user is looking at.

use std::io;

use console_core::TerminalSize;

/// Something that renders terminal output.
///
/// The production implementation writes to the local stdout in raw mode
/// ([`LocalTerminal`](crate::infrastructure::terminal::LocalTerminal)); tests
/// use [`RecordingTerminal`](crate::infrastructure::terminal::RecordingTerminal)
/// or the generated `MockTerminalSurface`.
#[cfg_attr(test, mockall::automock)]
pub trait TerminalSurface: Send {
    /// Writes bytes to the terminal exactly as given.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the terminal cannot be written.
    fn write_output(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Something the local terminal reports to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Raw bytes typed by the user.
    Input(Vec<u8>),
    /// The terminal viewport changed size.
    Resized(TerminalSize),
    /// The user asked to leave the session.
    Detach,
}
