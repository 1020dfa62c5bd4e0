//! Recording terminal for tests.
//!
//! `RecordingTerminal` stands in for the local terminal: every write is kept
//! in memory so a test can assert on exactly what the user would have seen.
//!
//! # Usage in tests
//!
//! ```ignore
//! let mut terminal = RecordingTerminal::new();
//! run_session(bridge, &connector, &mut terminal, rx, Some(size)).await?;
//! assert!(terminal.text().contains("Connected to terminal server"));
//! ```

use std::io;

use crate::application::surface::TerminalSurface;

/// A terminal that records every write.
#[derive(Debug, Default)]
pub struct RecordingTerminal {
    /// Each call to `write_output`, in order.
    pub writes: Vec<Vec<u8>>,
    /// When `true`, every write fails with `BrokenPipe`.
    pub should_fail: bool,
}

impl RecordingTerminal {
    /// Creates an empty recording terminal.
    pub fn new() -> Self {
        Self::default()
    }

    /// All written bytes, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// All written bytes as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Number of times `needle` was written as one complete write.
    pub fn count_writes(&self, needle: &[u8]) -> usize {
        self.writes.iter().filter(|w| w.as_slice() == needle).count()
    }
}

impl TerminalSurface for RecordingTerminal {
    fn write_output(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.should_fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "recording terminal closed"));
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }
}
