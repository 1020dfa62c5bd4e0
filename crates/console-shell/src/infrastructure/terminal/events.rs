//! Producers of [`TerminalEvent`]s.
//!
//! Three independent sources feed one channel:
//!
//! | Source             | Runs on                 | Emits                         |
//! |--------------------|-------------------------|-------------------------------|
//! | stdin reader       | dedicated OS thread     | `Input`, `Detach` (Ctrl+], EOF) |
//! | resize watcher     | tokio task              | `Resized` (only on change)    |
//! | interrupt watcher  | tokio task              | `Detach` (SIGINT / Ctrl+C)    |
//!
//! # Why a thread for stdin? (for beginners)
//!
//! Reading stdin blocks until the user types something, and there is no
//! portable way to cancel a blocked read.  A `spawn_blocking` task would keep
//! the tokio runtime from shutting down until the next keypress.  A plain OS
//! thread does not: when `main` returns the process exits and the thread goes
//! with it.

use std::io::{self, Read};
use std::thread::JoinHandle;
use std::time::Duration;

use console_core::TerminalSize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::surface::TerminalEvent;
use crate::infrastructure::terminal::local::LocalTerminal;

/// Ctrl+] ends the session, as in `telnet`.
pub const DETACH_KEY: u8 = 0x1D;

/// How often the terminal size is polled where SIGWINCH is unavailable.
const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(250);

const READ_BUFFER_LEN: usize = 1024;

// ── stdin ─────────────────────────────────────────────────────────────────────

/// Splits a chunk of keyboard input at the detach key.
///
/// Returns the bytes to forward and whether the detach key was pressed.
/// Anything typed after the detach key is discarded.
pub fn split_at_detach(chunk: &[u8]) -> (&[u8], bool) {
    match chunk.iter().position(|&b| b == DETACH_KEY) {
        Some(index) => (&chunk[..index], true),
        None => (chunk, false),
    }
}

/// Starts the stdin reader thread.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_stdin_reader(tx: mpsc::Sender<TerminalEvent>) -> io::Result<JoinHandle<()>> {
    spawn_input_reader(io::stdin(), tx)
}

/// Starts a thread that forwards everything read from `reader` as
/// [`TerminalEvent::Input`] until the detach key, end of input, or a closed
/// channel.  Detach key and end of input both send [`TerminalEvent::Detach`].
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_input_reader<R>(mut reader: R, tx: mpsc::Sender<TerminalEvent>) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_BUFFER_LEN];
            loop {
                let n = match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("stdin closed");
                        let _ = tx.blocking_send(TerminalEvent::Detach);
                        return;
                    }
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        let _ = tx.blocking_send(TerminalEvent::Detach);
                        return;
                    }
                };

                let (forward, detach) = split_at_detach(&buf[..n]);
                if !forward.is_empty()
                    && tx.blocking_send(TerminalEvent::Input(forward.to_vec())).is_err()
                {
                    return;
                }
                if detach {
                    info!("detach key pressed");
                    let _ = tx.blocking_send(TerminalEvent::Detach);
                    return;
                }
            }
        })
}

// ── resize ────────────────────────────────────────────────────────────────────

/// Remembers the last reported size so only real changes are emitted.
#[derive(Debug, Clone)]
pub struct ResizeTracker {
    last: TerminalSize,
}

impl ResizeTracker {
    /// Starts tracking from the size the session was initialised with.
    pub fn new(initial: TerminalSize) -> Self {
        Self { last: initial }
    }

    /// Returns the new size if it differs from the last one seen.
    pub fn observe(&mut self, measured: Option<TerminalSize>) -> Option<TerminalSize> {
        let size = measured?;
        if size == self.last {
            return None;
        }
        self.last = size;
        Some(size)
    }
}

/// Starts a task that emits [`TerminalEvent::Resized`] whenever the local
/// terminal changes size.  Uses SIGWINCH on Unix and polling elsewhere.
pub fn spawn_resize_watcher(
    tx: mpsc::Sender<TerminalEvent>,
    initial: TerminalSize,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(watch_resizes(tx, ResizeTracker::new(initial)))
}

async fn watch_resizes(tx: mpsc::Sender<TerminalEvent>, mut tracker: ResizeTracker) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::window_change()) {
            Ok(mut winch) => {
                while winch.recv().await.is_some() {
                    if !report_size(&tx, &mut tracker).await {
                        return;
                    }
                }
                return;
            }
            Err(e) => warn!("SIGWINCH unavailable ({e}); polling terminal size"),
        }
    }

    let mut ticker = tokio::time::interval(RESIZE_POLL_INTERVAL);
    loop {
        ticker.tick().await;
        if !report_size(&tx, &mut tracker).await {
            return;
        }
    }
}

/// Measures the terminal and sends a resize if it changed.  Returns `false`
/// once the session has stopped listening.
async fn report_size(tx: &mpsc::Sender<TerminalEvent>, tracker: &mut ResizeTracker) -> bool {
    match tracker.observe(LocalTerminal::current_size()) {
        Some(size) => tx.send(TerminalEvent::Resized(size)).await.is_ok(),
        None => !tx.is_closed(),
    }
}

// ── interrupt ─────────────────────────────────────────────────────────────────

/// Starts a task that detaches the session on SIGINT.
///
/// In raw mode Ctrl+C typed at the keyboard is an ordinary byte forwarded to
/// the remote shell; this only fires for a signal delivered from outside.
pub fn spawn_interrupt_watcher(tx: mpsc::Sender<TerminalEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received; detaching");
                let _ = tx.send(TerminalEvent::Detach).await;
            }
            Err(e) => warn!("failed to listen for Ctrl+C signal: {e}"),
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
