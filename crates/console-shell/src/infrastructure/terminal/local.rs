//! The local terminal in raw mode.
//!
//! # What is raw mode? (for beginners)
//!
//! Normally the terminal driver buffers a whole line, handles Backspace
//! itself, and turns Ctrl+C into a signal.  A remote shell needs every key as
//! it is pressed, including Ctrl+C and arrow keys, so the local terminal is
//! switched to raw mode for the duration of the session.  Raw mode also stops
//! the driver from translating `\n` into `\r\n` on output, which is fine
//! because the remote PTY already sends `\r\n`.

use std::io::{self, Write};

use console_core::TerminalSize;
use tracing::warn;

use crate::application::surface::TerminalSurface;

/// Stdout in raw mode.  Dropping it restores the previous terminal mode.
pub struct LocalTerminal {
    stdout: io::Stdout,
}

impl LocalTerminal {
    /// Switches the terminal to raw mode.
    ///
    /// # Errors
    ///
    /// Returns the I/O error reported by the terminal driver, e.g. when stdin
    /// is not a terminal.
    pub fn enter() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self {
            stdout: io::stdout(),
        })
    }

    /// Measures the terminal, or `None` when no terminal is attached.
    pub fn current_size() -> Option<TerminalSize> {
        // crossterm reports (columns, rows)
        crossterm::terminal::size()
            .ok()
            .map(|(cols, rows)| TerminalSize::new(rows, cols))
    }
}

impl TerminalSurface for LocalTerminal {
    fn write_output(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stdout.write_all(bytes)?;
        self.stdout.flush()
    }
}

impl Drop for LocalTerminal {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            warn!("failed to restore terminal mode: {e}");
        }
    }
}
