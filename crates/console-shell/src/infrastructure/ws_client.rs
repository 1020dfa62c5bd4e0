//! WebSocket connector for the terminal endpoint.

use futures_util::future::BoxFuture;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;

use console_core::config::{ConfigError, ServerConfig};
use console_core::OutgoingFrame;

/// An open `/ws/pty` connection.
pub type PtyStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connection attempt that has been started but not finished.
pub type PendingConnect = BoxFuture<'static, Result<PtyStream, WsError>>;

/// Opens connections to one terminal endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Creates a connector for an explicit `ws://` or `wss://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Creates a connector for the PTY path on the configured admin origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the origin is unusable.
    pub fn from_config(server: &ServerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(server.pty_url()?))
    }

    /// The URL this connector dials.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Starts a connection attempt.
    ///
    /// The returned future owns everything it needs, so the runner can keep
    /// it alongside other work and drop it to abandon the attempt.
    pub fn connect(&self) -> PendingConnect {
        let url = self.url.clone();
        Box::pin(async move {
            debug!("dialing {url}");
            let (stream, _response) = connect_async(url).await?;
            Ok(stream)
        })
    }
}

/// Converts a typed frame into the WebSocket message that carries it.
///
/// Input travels as a text frame and resize as a binary frame.
pub fn to_ws_message(frame: OutgoingFrame) -> WsMessage {
    match frame {
        OutgoingFrame::Input(text) => WsMessage::Text(text),
        OutgoingFrame::Resize(bytes) => WsMessage::Binary(bytes.to_vec()),
    }
}
