//! Session runner: the single event loop behind one terminal session.
//!
//! # How the loop works (for beginners)
//!
//! `tokio::select!` waits on several things at once and wakes up for whichever
//! happens first:
//!
//! ```text
//!  ┌──────────────────────┐
//!  │ in-flight connect    │──▶ SocketOpened  /  SocketError + SocketClosed
//!  │ open socket stream   │──▶ SocketMessage /  SocketClosed
//!  │ reconnect timer      │──▶ ReconnectTimerFired
//!  │ terminal events      │──▶ TerminalInput / TerminalResized / teardown
//!  └──────────────────────┘
//!              │ events
//!              ▼
//!       TerminalBridge ──▶ commands ──▶ executed here, in order
//! ```
//!
//! Each source is an `Option`: when it is `None` its branch waits forever, so
//! a session with no socket simply never wakes up for socket messages.  At most
//! one of "in-flight connect" and "open socket" is ever `Some`.

use std::pin::Pin;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info, warn};

use console_core::{OutputPayload, SessionState, TerminalSize};

use crate::application::bridge::{BridgeCommand, BridgeEvent, TerminalBridge};
use crate::application::surface::{TerminalEvent, TerminalSurface};
use crate::infrastructure::ws_client::{to_ws_message, PendingConnect, PtyStream, WsConnector};

/// Runs one session until it is torn down or gives up reconnecting.
///
/// `initial_size` is the terminal size at start-up; `None` means no terminal
/// is attached and the function returns immediately.  The session is torn
/// down when `events` yields [`TerminalEvent::Detach`] or is closed.
///
/// Returns the final state: [`SessionState::TornDown`] after a detach,
/// [`SessionState::Disconnected`] when there was no terminal or the reconnect
/// policy gave up.
///
/// # Errors
///
/// Returns an error if writing to the terminal fails.  Socket failures are
/// never errors; they are reported on the terminal and retried.
pub async fn run_session<S>(
    mut bridge: TerminalBridge,
    connector: &WsConnector,
    terminal: &mut S,
    mut events: mpsc::Receiver<TerminalEvent>,
    initial_size: Option<TerminalSize>,
) -> anyhow::Result<SessionState>
where
    S: TerminalSurface + ?Sized,
{
    let mut io = SessionIo::default();

    let commands = bridge.initialize(initial_size);
    io.execute(commands, connector, terminal).await?;

    while !io.finished(&bridge) {
        let wake = tokio::select! {
            result = next_connect(&mut io.connecting) => Wake::Connect(result),
            message = next_message(&mut io.socket) => Wake::Socket(message),
            () = next_timer(&mut io.reconnect) => Wake::Timer,
            event = events.recv() => Wake::Terminal(event),
        };

        let bridge_events = match wake {
            Wake::Connect(Ok(stream)) => {
                io.connecting = None;
                io.socket = Some(stream);
                vec![BridgeEvent::SocketOpened]
            }
            Wake::Connect(Err(e)) => {
                io.connecting = None;
                vec![BridgeEvent::SocketError(e.to_string()), BridgeEvent::SocketClosed]
            }
            Wake::Socket(message) => io.socket_event(message).await.into_iter().collect(),
            Wake::Timer => {
                io.reconnect = None;
                vec![BridgeEvent::ReconnectTimerFired]
            }
            Wake::Terminal(Some(TerminalEvent::Input(data))) => {
                vec![BridgeEvent::TerminalInput(data)]
            }
            Wake::Terminal(Some(TerminalEvent::Resized(size))) => {
                vec![BridgeEvent::TerminalResized(size)]
            }
            Wake::Terminal(Some(TerminalEvent::Detach) | None) => {
                let commands = bridge.teardown();
                io.execute(commands, connector, terminal).await?;
                continue;
            }
        };

        for event in bridge_events {
            let commands = bridge.handle(event);
            io.execute(commands, connector, terminal).await?;
        }
    }

    info!(state = %bridge.state(), "session ended");
    Ok(bridge.state())
}

/// What woke the loop up.
enum Wake {
    Connect(Result<PtyStream, WsError>),
    Socket(Option<Result<WsMessage, WsError>>),
    Timer,
    Terminal(Option<TerminalEvent>),
}

/// The I/O resources owned by a session.
#[derive(Default)]
struct SessionIo {
    connecting: Option<PendingConnect>,
    socket: Option<PtyStream>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl SessionIo {
    /// The loop ends once the bridge is torn down, or once it has settled in
    /// `Disconnected` with nothing left that could wake it.
    fn finished(&self, bridge: &TerminalBridge) -> bool {
        match bridge.state() {
            SessionState::TornDown => true,
            SessionState::Disconnected => {
                self.connecting.is_none() && self.socket.is_none() && self.reconnect.is_none()
            }
            _ => false,
        }
    }

    /// Translates one item from the socket stream.  Control frames produce
    /// nothing; the socket is dropped before `SocketClosed` is reported.
    ///
    /// A close frame from the server is answered before the socket is
    /// dropped, completing the closing handshake.
    async fn socket_event(
        &mut self,
        message: Option<Result<WsMessage, WsError>>,
    ) -> Option<BridgeEvent> {
        match message {
            Some(Ok(WsMessage::Text(text))) => {
                Some(BridgeEvent::SocketMessage(OutputPayload::Text(text)))
            }
            Some(Ok(WsMessage::Binary(bytes))) => {
                Some(BridgeEvent::SocketMessage(OutputPayload::Binary(bytes)))
            }
            Some(Ok(WsMessage::Close(frame))) => {
                debug!(?frame, "server sent close");
                if let Some(mut socket) = self.socket.take() {
                    // The sink close flushes the reply queued on receipt.
                    if let Err(e) = SinkExt::close(&mut socket).await {
                        debug!("close reply failed: {e}");
                    }
                }
                Some(BridgeEvent::SocketClosed)
            }
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => None,
            Some(Err(e)) => {
                warn!("socket stream error: {e}");
                self.socket = None;
                Some(BridgeEvent::SocketClosed)
            }
            None => {
                self.socket = None;
                Some(BridgeEvent::SocketClosed)
            }
        }
    }

    async fn execute<S>(
        &mut self,
        commands: Vec<BridgeCommand>,
        connector: &WsConnector,
        terminal: &mut S,
    ) -> anyhow::Result<()>
    where
        S: TerminalSurface + ?Sized,
    {
        for command in commands {
            match command {
                BridgeCommand::OpenSocket => {
                    if self.connecting.is_some() || self.socket.is_some() {
                        warn!("open requested while a socket exists; ignored");
                        continue;
                    }
                    info!("connecting to {}", connector.url());
                    self.connecting = Some(connector.connect());
                }
                BridgeCommand::Send(frame) => {
                    let Some(socket) = self.socket.as_mut() else {
                        debug!("send with no open socket; dropped");
                        continue;
                    };
                    if let Err(e) = socket.send(to_ws_message(frame)).await {
                        warn!("send failed: {e}");
                    }
                }
                BridgeCommand::Write(output) => {
                    terminal
                        .write_output(output.as_bytes())
                        .context("failed to write to terminal")?;
                }
                BridgeCommand::ArmReconnect(delay) => {
                    self.reconnect = Some(Box::pin(sleep(delay)));
                }
                BridgeCommand::CancelReconnect => {
                    self.reconnect = None;
                }
                BridgeCommand::CloseSocket => {
                    self.connecting = None;
                    if let Some(mut socket) = self.socket.take() {
                        if let Err(e) = socket.close(None).await {
                            debug!("close handshake failed: {e}");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

async fn next_connect(pending: &mut Option<PendingConnect>) -> Result<PtyStream, WsError> {
    match pending {
        Some(connect) => connect.await,
        None => std::future::pending().await,
    }
}

async fn next_message(socket: &mut Option<PtyStream>) -> Option<Result<WsMessage, WsError>> {
    match socket {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(delay) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
