//! Frame codec for the `/ws/pty` WebSocket channel.
//!
//! Wire format:
//! ```text
//! client → server  text    base64(UTF-8 keystrokes)
//! client → server  binary  [marker=0x01][rows:2][cols:2]     (resize, big-endian)
//! server → client  binary  raw terminal bytes                (passed through)
//! server → client  text    base64(terminal output)           (see decode_output)
//! ```
//!
//! # Why is output sometimes base64 text? (for beginners)
//!
//! The server reads from a pseudo-terminal and forwards whatever the shell
//! printed.  Those bytes are not guaranteed to be valid UTF-8 (a read can split
//! a multi-byte character, and programs may print raw control bytes), but a
//! WebSocket *text* frame must be valid UTF-8.  Base64 sidesteps the problem by
//! turning any byte sequence into plain ASCII.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use thiserror::Error;

use crate::domain::session::TerminalSize;

/// First byte of every resize control frame.
pub const RESIZE_MARKER: u8 = 1;

/// Exact length of a resize control frame in bytes.
pub const RESIZE_FRAME_LEN: usize = 5;

/// Base64 decoder that accepts what a browser's `atob()` accepts: padding is
/// optional and stray trailing bits are discarded.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Errors that can occur while encoding or decoding PTY frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A resize frame did not have exactly five bytes.
    #[error("resize frame must be 5 bytes, got {0}")]
    InvalidResizeLength(usize),

    /// A resize frame started with something other than [`RESIZE_MARKER`].
    #[error("resize frame marker must be 0x01, got 0x{0:02X}")]
    InvalidResizeMarker(u8),

    /// A text frame from the server was not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A frame received from the server, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPayload {
    /// A WebSocket binary frame.
    Binary(Vec<u8>),
    /// A WebSocket text frame.
    Text(String),
}

/// What should be written to the terminal for one server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutput {
    /// Raw bytes, written verbatim.
    Bytes(Vec<u8>),
    /// Decoded UTF-8 text.
    Text(String),
}

impl TerminalOutput {
    /// Returns the bytes that end up on the terminal.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }
}

/// A frame sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingFrame {
    /// Base64-encoded keystrokes, sent as a text frame.
    Input(String),
    /// Resize control message, sent as a binary frame.
    Resize([u8; RESIZE_FRAME_LEN]),
}

impl OutgoingFrame {
    /// Builds an input frame from raw keystroke bytes.
    pub fn input(data: impl AsRef<[u8]>) -> Self {
        Self::Input(encode_input(data))
    }

    /// Builds a resize frame announcing `size`.
    pub fn resize(size: TerminalSize) -> Self {
        Self::Resize(encode_resize(size.rows, size.cols))
    }
}

// ── Resize frames ─────────────────────────────────────────────────────────────

/// Encodes the 5-byte resize control frame.
///
/// Both dimensions are `u16`, so values outside `0..=65535` cannot reach this
/// function.  Use [`TerminalSize::from_dimensions`] to convert wider integers;
/// it rejects out-of-range values instead of truncating them.
///
/// # Examples
///
/// ```rust
/// use console_core::protocol::{encode_resize, decode_resize};
///
/// let frame = encode_resize(24, 80);
/// assert_eq!(frame, [0x01, 0x00, 0x18, 0x00, 0x50]);
/// assert_eq!(decode_resize(&frame).unwrap(), (24, 80));
/// ```
pub fn encode_resize(rows: u16, cols: u16) -> [u8; RESIZE_FRAME_LEN] {
    let [r0, r1] = rows.to_be_bytes();
    let [c0, c1] = cols.to_be_bytes();
    [RESIZE_MARKER, r0, r1, c0, c1]
}

/// Parses a resize control frame back into `(rows, cols)`.
///
/// # Errors
///
/// Returns [`FrameError::InvalidResizeLength`] when `bytes` is not exactly five
/// bytes long and [`FrameError::InvalidResizeMarker`] when the first byte is
/// not [`RESIZE_MARKER`].
pub fn decode_resize(bytes: &[u8]) -> Result<(u16, u16), FrameError> {
    if bytes.len() != RESIZE_FRAME_LEN {
        return Err(FrameError::InvalidResizeLength(bytes.len()));
    }
    if bytes[0] != RESIZE_MARKER {
        return Err(FrameError::InvalidResizeMarker(bytes[0]));
    }
    let rows = u16::from_be_bytes([bytes[1], bytes[2]]);
    let cols = u16::from_be_bytes([bytes[3], bytes[4]]);
    Ok((rows, cols))
}

// ── Input frames ──────────────────────────────────────────────────────────────

/// Encodes keystrokes as standard, padded base64.
///
/// Text input is passed as its UTF-8 bytes (`&str` implements `AsRef<[u8]>`).
///
/// # Examples
///
/// ```rust
/// use console_core::protocol::encode_input;
///
/// assert_eq!(encode_input("ls\r"), "bHMN");
/// ```
pub fn encode_input(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(data.as_ref())
}

// ── Output frames ─────────────────────────────────────────────────────────────

/// Interprets one server frame.
///
/// Binary frames pass through untouched.  Text frames are base64-decoded and
/// the result is read as UTF-8 (invalid sequences become U+FFFD).  If the first
/// decoded character is a C0 control character (code point below 0x20) the raw
/// decoded bytes are returned instead of the text, so escape sequences reach the
/// terminal byte-for-byte.
///
/// The control-character check only looks at the first character.  A payload
/// whose first real character happens to be a control character is therefore
/// treated as raw bytes even if it was meant as text; the two paths only differ
/// when the decoded bytes are not valid UTF-8.
///
/// # Errors
///
/// Returns [`FrameError::InvalidBase64`] when a text frame is not base64.
pub fn decode_output(payload: OutputPayload) -> Result<TerminalOutput, FrameError> {
    match payload {
        OutputPayload::Binary(bytes) => Ok(TerminalOutput::Bytes(bytes)),
        OutputPayload::Text(text) => decode_text_frame(&text),
    }
}

fn decode_text_frame(text: &str) -> Result<TerminalOutput, FrameError> {
    let compact: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let raw = FORGIVING
        .decode(&compact)
        .map_err(|e| FrameError::InvalidBase64(e.to_string()))?;

    let mut text = String::from_utf8_lossy(&raw).into_owned();
    if text.starts_with('\u{FEFF}') {
        text.drain(..'\u{FEFF}'.len_utf8());
    }

    let control_first = text.chars().next().is_some_and(|c| u32::from(c) < 0x20);
    if control_first {
        Ok(TerminalOutput::Bytes(raw))
    } else {
        Ok(TerminalOutput::Text(text))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
