//! Session domain types: terminal dimensions and connection states.

use std::fmt;

use thiserror::Error;

/// Error returned when a terminal dimension does not fit in the wire format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    /// `rows` or `cols` is larger than `u16::MAX`.
    #[error("terminal {axis} {value} exceeds the 16-bit resize frame limit")]
    DimensionOutOfRange { axis: &'static str, value: usize },
}

/// Size of the terminal viewport in character cells.
///
/// Dimensions are stored as `u16` because that is what the resize control
/// frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalSize {
    /// Number of visible rows.
    pub rows: u16,
    /// Number of visible columns.
    pub cols: u16,
}

impl TerminalSize {
    /// Creates a size from already-validated dimensions.
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Creates a size from arbitrary integers, rejecting values that would
    /// otherwise be silently truncated on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::DimensionOutOfRange`] naming the first offending
    /// axis.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use console_core::TerminalSize;
    ///
    /// assert_eq!(TerminalSize::from_dimensions(40, 120).unwrap(), TerminalSize::new(40, 120));
    /// assert!(TerminalSize::from_dimensions(70_000, 80).is_err());
    /// ```
    pub fn from_dimensions(rows: usize, cols: usize) -> Result<Self, SizeError> {
        let rows = u16::try_from(rows).map_err(|_| SizeError::DimensionOutOfRange {
            axis: "rows",
            value: rows,
        })?;
        let cols = u16::try_from(cols).map_err(|_| SizeError::DimensionOutOfRange {
            axis: "cols",
            value: cols,
        })?;
        Ok(Self { rows, cols })
    }
}

impl Default for TerminalSize {
    /// 24×80, the size the server gives a fresh PTY before the client reports
    /// its real dimensions.
    fn default() -> Self {
        Self::new(24, 80)
    }
}

impl fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Lifecycle state of one terminal session.
///
/// ```text
///                 initialize                 socket opened
///  Disconnected ─────────────▶ Connecting ─────────────────▶ Connected
///       ▲                        ▲    │                          │
///       │ attempts exhausted     │    │ socket closed            │ socket closed
///       │                  timer │    ▼                          │
///       └──────────────── ReconnectPending ◀─────────────────────┘
///
///  any state ── teardown ──▶ TornDown   (absorbing)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No socket and no reconnect armed.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The socket is open; input and resize frames flow.
    Connected,
    /// The previous socket has closed and a reconnect timer is armed.
    ReconnectPending,
    /// The session has been torn down; all further events are ignored.
    TornDown,
}

impl SessionState {
    /// Returns `true` while a socket exists or is being opened.
    pub fn has_socket(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ReconnectPending => "reconnect-pending",
            Self::TornDown => "torn-down",
        };
        f.write_str(name)
    }
}
