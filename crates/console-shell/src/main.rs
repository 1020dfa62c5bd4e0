//! Caddy Console shell: an interactive terminal on a Caddy admin server.
//!
//! Connects to the `/ws/pty` WebSocket exposed by the admin UI module and
//! attaches the local terminal to the shell behind it.
//!
//! # Usage
//!
//! ```text
//! console-shell [OPTIONS]
//!
//! Options:
//!   --config <PATH>                   Config file [default: platform config dir]
//!   --origin <URL>                    Admin origin, e.g. http://localhost:2019
//!   --reconnect-delay-ms <MS>         Delay before the first reconnect
//!   --reconnect-multiplier <FACTOR>   Backoff growth per failed attempt
//!   --reconnect-max-delay-ms <MS>     Upper bound on the reconnect delay
//!   --max-attempts <N>                Give up after N failed reconnects
//! ```
//!
//! Press `Ctrl+]` to detach.
//!
//! # Environment variable overrides
//!
//! | Variable                              | Flag                        |
//! |---------------------------------------|-----------------------------|
//! | `CADDY_CONSOLE_CONFIG`                | `--config`                  |
//! | `CADDY_CONSOLE_ORIGIN`                | `--origin`                  |
//! | `CADDY_CONSOLE_RECONNECT_DELAY_MS`    | `--reconnect-delay-ms`      |
//! | `CADDY_CONSOLE_RECONNECT_MULTIPLIER`  | `--reconnect-multiplier`    |
//! | `CADDY_CONSOLE_RECONNECT_MAX_DELAY_MS`| `--reconnect-max-delay-ms`  |
//! | `CADDY_CONSOLE_MAX_ATTEMPTS`          | `--max-attempts`            |
//!
//! Logs go to stderr.  Redirect them (`2>shell.log`) to keep the terminal
//! clean, and set `RUST_LOG=console_shell=debug` for frame-level detail.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use console_core::config::{load_config, ConsoleConfig};
use console_core::SessionState;
use console_shell::application::TerminalBridge;
use console_shell::infrastructure::runner::run_session;
use console_shell::infrastructure::terminal::{
    spawn_interrupt_watcher, spawn_resize_watcher, spawn_stdin_reader, LocalTerminal,
};
use console_shell::infrastructure::ws_client::WsConnector;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Interactive terminal on a Caddy admin server.
#[derive(Debug, Parser)]
#[command(
    name = "console-shell",
    about = "Attach the local terminal to the Caddy admin /ws/pty shell",
    version
)]
struct Cli {
    /// Path to console.toml.  Defaults to the platform config directory.
    #[arg(long, env = "CADDY_CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP origin of the Caddy admin endpoint.
    #[arg(long, env = "CADDY_CONSOLE_ORIGIN")]
    origin: Option<String>,

    /// Delay before the first reconnect attempt, in milliseconds.
    #[arg(long, env = "CADDY_CONSOLE_RECONNECT_DELAY_MS")]
    reconnect_delay_ms: Option<u64>,

    /// Growth factor applied to the delay after each failed attempt.
    #[arg(long, env = "CADDY_CONSOLE_RECONNECT_MULTIPLIER")]
    reconnect_multiplier: Option<f64>,

    /// Upper bound on the reconnect delay, in milliseconds.
    #[arg(long, env = "CADDY_CONSOLE_RECONNECT_MAX_DELAY_MS")]
    reconnect_max_delay_ms: Option<u64>,

    /// Give up after this many consecutive failed reconnects.
    #[arg(long, env = "CADDY_CONSOLE_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,
}

impl Cli {
    /// Applies flag values on top of the file configuration.
    ///
    /// Setting only `--reconnect-delay-ms` keeps the delay fixed: the cap is
    /// raised to match so the policy stays valid.
    fn apply(&self, mut config: ConsoleConfig) -> ConsoleConfig {
        if let Some(origin) = &self.origin {
            config.server.origin = origin.clone();
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.shell.reconnect_delay_ms = delay;
            if self.reconnect_max_delay_ms.is_none() {
                config.shell.reconnect_max_delay_ms =
                    config.shell.reconnect_max_delay_ms.max(delay);
            }
        }
        if let Some(multiplier) = self.reconnect_multiplier {
            config.shell.reconnect_multiplier = multiplier;
        }
        if let Some(max_delay) = self.reconnect_max_delay_ms {
            config.shell.reconnect_max_delay_ms = max_delay;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.shell.reconnect_max_attempts = Some(max_attempts);
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file_config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let config = cli.apply(file_config);

    // Logs go to stderr; stdout belongs to the remote terminal.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .init();

    let policy = config
        .shell
        .reconnect_policy()
        .context("invalid reconnect settings")?;
    let connector = WsConnector::from_config(&config.server).context("invalid admin origin")?;

    // ── Terminal ──────────────────────────────────────────────────────────────
    let initial_size = LocalTerminal::current_size();
    let Some(size) = initial_size else {
        warn!("no terminal attached; nothing to do");
        return Ok(());
    };
    let mut terminal = LocalTerminal::enter().context("failed to enable raw mode")?;

    // ── Event producers ───────────────────────────────────────────────────────
    let (tx, rx) = mpsc::channel(256);
    spawn_stdin_reader(tx.clone()).context("failed to start stdin reader")?;
    let resize_task = spawn_resize_watcher(tx.clone(), size);
    let interrupt_task = spawn_interrupt_watcher(tx);

    // ── Session ───────────────────────────────────────────────────────────────
    let session_id = Uuid::new_v4();
    let span = info_span!("session", id = %session_id);
    info!(parent: &span, url = connector.url(), %size, "starting terminal session");

    let result = run_session(
        TerminalBridge::new(policy),
        &connector,
        &mut terminal,
        rx,
        initial_size,
    )
    .instrument(span)
    .await;

    resize_task.abort();
    interrupt_task.abort();
    drop(terminal);

    match result.context("terminal session failed")? {
        SessionState::Disconnected => anyhow::bail!("gave up reconnecting to {}", connector.url()),
        _ => {
            eprintln!("\r\nDetached.");
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_keeps_file_config() {
        let cli = Cli::parse_from(["console-shell"]);
        let file = ConsoleConfig::default();

        assert_eq!(cli.apply(file.clone()), file);
    }

    #[test]
    fn test_cli_origin_override() {
        let cli = Cli::parse_from(["console-shell", "--origin", "https://caddy.lan:2019"]);

        let config = cli.apply(ConsoleConfig::default());

        assert_eq!(config.server.origin, "https://caddy.lan:2019");
    }

    #[test]
    fn test_cli_delay_alone_stays_fixed_and_valid() {
        // Arrange
        let cli = Cli::parse_from(["console-shell", "--reconnect-delay-ms", "5000"]);

        // Act
        let config = cli.apply(ConsoleConfig::default());
        let policy = config.shell.reconnect_policy().unwrap();

        // Assert
        assert_eq!(config.shell.reconnect_max_delay_ms, 5000);
        assert_eq!(
            policy.delay_for(0),
            Some(std::time::Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_cli_backoff_overrides() {
        let cli = Cli::parse_from([
            "console-shell",
            "--reconnect-delay-ms",
            "500",
            "--reconnect-multiplier",
            "2",
            "--reconnect-max-delay-ms",
            "8000",
            "--max-attempts",
            "6",
        ]);

        let config = cli.apply(ConsoleConfig::default());

        assert_eq!(config.shell.reconnect_delay_ms, 500);
        assert_eq!(config.shell.reconnect_multiplier, 2.0);
        assert_eq!(config.shell.reconnect_max_delay_ms, 8000);
        assert_eq!(config.shell.reconnect_max_attempts, Some(6));
    }

    #[test]
    fn test_cli_invalid_multiplier_is_caught_by_policy() {
        let cli = Cli::parse_from(["console-shell", "--reconnect-multiplier", "0.5"]);

        let config = cli.apply(ConsoleConfig::default());

        assert!(config.shell.reconnect_policy().is_err());
    }
}
