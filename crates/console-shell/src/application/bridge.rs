//! Terminal bridge: the connection state machine for one terminal session.
//!
//! The bridge decides *what* should happen when something occurs on the
//! socket, the reconnect timer, or the local terminal.  It does not perform
//! any of it.  Every operation returns a list of [`BridgeCommand`]s which the
//! session runner executes in order.
//!
//! # Why no I/O here? (for beginners)
//!
//! A WebSocket client that reconnects on its own is easy to get subtly wrong:
//! a timer that fires after the user has left, two sockets open at once, a
//! resize sent into a socket that is still handshaking.  Keeping the rules in
//! a plain struct means each rule can be tested by feeding events in and
//! comparing the commands that come out, without sockets or sleeps.
//!
//! # Transitions
//!
//! ```text
//! state             event                commands                            next
//! ───────────────── ──────────────────── ─────────────────────────────────── ────────────────
//! Disconnected      initialize(None)     (none)                              Disconnected
//! Disconnected      initialize(size)     Write(init), OpenSocket             Connecting
//! Connecting        SocketOpened         Write(connected), Send(Resize)      Connected
//! Connecting/ed     SocketError          Write(error banner)                 (unchanged)
//! Connecting/ed     SocketClosed         Write(disconnected), ArmReconnect   ReconnectPending
//! Connecting/ed     SocketClosed (last)  Write(give-up banner)               Disconnected
//! ReconnectPending  ReconnectTimerFired  OpenSocket                          Connecting
//! Connected         TerminalInput        Send(Input)                         Connected
//! Connected         TerminalResized      Send(Resize)                        Connected
//! Connected         SocketMessage        Write(output)                       Connected
//! ReconnectPending  teardown             CancelReconnect                     TornDown
//! Connecting/ed     teardown             CloseSocket                         TornDown
//! ```
//!
//! Anything not listed is a stale event and produces no commands.

use std::time::Duration;

use console_core::{
    decode_output, OutgoingFrame, OutputPayload, ReconnectPolicy, SessionState, TerminalOutput,
    TerminalSize,
};
use tracing::{debug, info, warn};

// ── Banners ───────────────────────────────────────────────────────────────────

/// Written when the terminal is first set up.
pub const INIT_BANNER: &str = "\x1b[36mInitializing terminal emulator...\x1b[0m\r\n";

/// Written each time the socket opens.
pub const CONNECTED_BANNER: &str = "\r\n\x1b[32mConnected to terminal server\x1b[0m\r\n";

/// Written each time the socket closes and a reconnect is scheduled.
pub const DISCONNECTED_BANNER: &str =
    "\r\n\x1b[31mConnection closed. Attempting to reconnect...\x1b[0m\r\n";

/// Written when the socket closes and the reconnect policy has given up.
pub const GIVE_UP_BANNER: &str =
    "\r\n\x1b[31mConnection closed. Reconnect attempts exhausted.\x1b[0m\r\n";

/// Builds the banner written for a transport error.
pub fn error_banner(message: &str) -> String {
    format!("\r\n\x1b[31mWebSocket error: {message}\x1b[0m\r\n")
}

// ── Events and commands ───────────────────────────────────────────────────────

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The WebSocket handshake completed.
    SocketOpened,
    /// A frame arrived from the server.
    SocketMessage(OutputPayload),
    /// The transport reported an error.  A `SocketClosed` follows separately.
    SocketError(String),
    /// The socket is gone (close frame, stream end, or failed connect).
    SocketClosed,
    /// The user typed something.
    TerminalInput(Vec<u8>),
    /// The local terminal changed size.
    TerminalResized(TerminalSize),
    /// The armed reconnect delay elapsed.
    ReconnectTimerFired,
}

/// Something the session runner must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Start opening a new WebSocket.
    OpenSocket,
    /// Send a frame on the open socket.
    Send(OutgoingFrame),
    /// Write bytes to the terminal.
    Write(TerminalOutput),
    /// Arm the reconnect timer, replacing any armed one.
    ArmReconnect(Duration),
    /// Disarm the reconnect timer.
    CancelReconnect,
    /// Close the socket, or abandon the in-flight connect.
    CloseSocket,
}

fn write_text(text: impl Into<String>) -> BridgeCommand {
    BridgeCommand::Write(TerminalOutput::Text(text.into()))
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// State machine for one terminal session.
///
/// A bridge is owned by exactly one session runner.  It tracks the current
/// [`SessionState`], the last known terminal size, and how many reconnect
/// attempts have been made since the last successful open.
#[derive(Debug)]
pub struct TerminalBridge {
    state: SessionState,
    size: TerminalSize,
    policy: ReconnectPolicy,
    attempts: u32,
}

impl TerminalBridge {
    /// Creates a bridge in the `Disconnected` state.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: SessionState::Disconnected,
            size: TerminalSize::default(),
            policy,
            attempts: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last terminal size reported by the local terminal.
    pub fn size(&self) -> TerminalSize {
        self.size
    }

    /// Reconnect attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Feeds one event to the bridge.
    pub fn handle(&mut self, event: BridgeEvent) -> Vec<BridgeCommand> {
        match event {
            BridgeEvent::SocketOpened => self.on_socket_opened(),
            BridgeEvent::SocketMessage(payload) => self.handle_incoming_frame(payload),
            BridgeEvent::SocketError(message) => self.on_socket_error(&message),
            BridgeEvent::SocketClosed => self.on_socket_closed(),
            BridgeEvent::TerminalInput(data) => self.handle_outgoing_input(&data),
            BridgeEvent::TerminalResized(size) => self.handle_resize(size),
            BridgeEvent::ReconnectTimerFired => self.on_reconnect_timer(),
        }
    }

    // ── Named operations ──────────────────────────────────────────────────────

    /// Sets the session up against a terminal of the given size and opens the
    /// first connection.
    ///
    /// `None` means there is no terminal to attach to; the call is a no-op and
    /// the bridge stays `Disconnected`.  Calling it again after the first
    /// successful call does nothing.
    pub fn initialize(&mut self, size: Option<TerminalSize>) -> Vec<BridgeCommand> {
        if self.state != SessionState::Disconnected {
            return Vec::new();
        }
        let Some(size) = size else {
            debug!("no terminal available; session not started");
            return Vec::new();
        };

        self.size = size;
        let mut commands = vec![write_text(INIT_BANNER)];
        commands.extend(self.connect());
        commands
    }

    /// Opens a new socket.  Only valid while no socket exists.
    pub fn connect(&mut self) -> Vec<BridgeCommand> {
        match self.state {
            SessionState::Disconnected | SessionState::ReconnectPending => {
                debug!(from = %self.state, "opening socket");
                self.state = SessionState::Connecting;
                vec![BridgeCommand::OpenSocket]
            }
            _ => Vec::new(),
        }
    }

    /// Arms the next reconnect according to the policy, or gives up.
    ///
    /// Only reachable through [`BridgeEvent::SocketClosed`] from a state that
    /// had a socket, so the previous socket is always gone when this runs.
    fn schedule_reconnect(&mut self) -> Vec<BridgeCommand> {
        if !self.state.has_socket() {
            return Vec::new();
        }
        match self.policy.delay_for(self.attempts) {
            Some(delay) => {
                self.attempts += 1;
                self.state = SessionState::ReconnectPending;
                info!(attempt = self.attempts, ?delay, "reconnect scheduled");
                vec![write_text(DISCONNECTED_BANNER), BridgeCommand::ArmReconnect(delay)]
            }
            None => {
                self.state = SessionState::Disconnected;
                warn!(attempts = self.attempts, "reconnect attempts exhausted");
                vec![write_text(GIVE_UP_BANNER)]
            }
        }
    }

    /// Forwards keystrokes to the server.  Dropped unless connected.
    pub fn handle_outgoing_input(&mut self, data: &[u8]) -> Vec<BridgeCommand> {
        if self.state != SessionState::Connected {
            debug!(len = data.len(), state = %self.state, "input dropped");
            return Vec::new();
        }
        vec![BridgeCommand::Send(OutgoingFrame::input(data))]
    }

    /// Interprets one server frame and writes it to the terminal.
    ///
    /// A text frame that is not valid base64 is written as-is and logged.
    pub fn handle_incoming_frame(&mut self, payload: OutputPayload) -> Vec<BridgeCommand> {
        if self.state != SessionState::Connected {
            return Vec::new();
        }

        let fallback = match &payload {
            OutputPayload::Text(text) => Some(text.clone()),
            OutputPayload::Binary(_) => None,
        };
        match decode_output(payload) {
            Ok(output) => vec![BridgeCommand::Write(output)],
            Err(e) => {
                warn!("undecodable output frame written verbatim: {e}");
                vec![BridgeCommand::Write(TerminalOutput::Text(
                    fallback.unwrap_or_default(),
                ))]
            }
        }
    }

    /// Records the new size and tells the server when connected.
    ///
    /// While not connected the size is only remembered; it is sent as part of
    /// the next successful open.
    pub fn handle_resize(&mut self, size: TerminalSize) -> Vec<BridgeCommand> {
        if self.state == SessionState::TornDown {
            return Vec::new();
        }
        self.size = size;
        if self.state != SessionState::Connected {
            return Vec::new();
        }
        debug!(%size, "terminal resized");
        vec![BridgeCommand::Send(OutgoingFrame::resize(size))]
    }

    /// Ends the session: disarms the timer, closes the socket, and ignores
    /// every later event.
    pub fn teardown(&mut self) -> Vec<BridgeCommand> {
        let commands = match self.state {
            SessionState::ReconnectPending => vec![BridgeCommand::CancelReconnect],
            SessionState::Connecting | SessionState::Connected => {
                vec![BridgeCommand::CloseSocket]
            }
            SessionState::Disconnected => Vec::new(),
            SessionState::TornDown => return Vec::new(),
        };
        info!(from = %self.state, "session torn down");
        self.state = SessionState::TornDown;
        commands
    }

    // ── Socket and timer callbacks ────────────────────────────────────────────

    fn on_socket_opened(&mut self) -> Vec<BridgeCommand> {
        if self.state != SessionState::Connecting {
            return Vec::new();
        }
        info!(size = %self.size, "connected to terminal server");
        self.state = SessionState::Connected;
        self.attempts = 0;
        vec![
            write_text(CONNECTED_BANNER),
            BridgeCommand::Send(OutgoingFrame::resize(self.size)),
        ]
    }

    fn on_socket_error(&mut self, message: &str) -> Vec<BridgeCommand> {
        if !self.state.has_socket() {
            return Vec::new();
        }
        warn!("websocket error: {message}");
        vec![write_text(error_banner(message))]
    }

    fn on_socket_closed(&mut self) -> Vec<BridgeCommand> {
        if !self.state.has_socket() {
            return Vec::new();
        }
        info!(from = %self.state, "socket closed");
        self.schedule_reconnect()
    }

    fn on_reconnect_timer(&mut self) -> Vec<BridgeCommand> {
        if self.state != SessionState::ReconnectPending {
            return Vec::new();
        }
        self.connect()
    }
}

impl Default for TerminalBridge {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
