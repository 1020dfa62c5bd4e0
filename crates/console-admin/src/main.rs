//! Caddy Console admin: the admin UI's views on the command line.
//!
//! # Usage
//!
//! ```text
//! console-admin [OPTIONS] <COMMAND>
//!
//! Commands:
//!   config                 Print the running configuration as JSON
//!   load <FILE|->          Replace the running configuration
//!   adapt <FILE|->         Convert a Caddyfile to JSON without applying it
//!   upstreams              Show reverse-proxy upstreams
//!   metrics                Show Prometheus metrics
//!   pki                    Show certificate authorities
//!   init-config            Write a default console.toml
//!
//! Options:
//!   --config <PATH>        Config file [default: platform config dir]
//!   --origin <URL>         Admin origin, e.g. http://localhost:2019
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable               | Flag       |
//! |------------------------|------------|
//! | `CADDY_CONSOLE_CONFIG` | `--config` |
//! | `CADDY_CONSOLE_ORIGIN` | `--origin` |
//!
//! Any failure (unreachable server, HTTP error status, malformed response)
//! is printed to stderr and the process exits with a non-zero status.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use console_admin::application::views::{
    render_adapt, render_json, render_metric_table, render_metrics, render_pki, render_upstreams,
};
use console_admin::application::{AdminApi, PkiService};
use console_admin::domain::{parse_metrics, CertificatePart};
use console_admin::infrastructure::AdminClient;
use console_core::config::{config_file_path, load_config, save_config_to, ConsoleConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line views over the Caddy admin API.
#[derive(Debug, Parser)]
#[command(
    name = "console-admin",
    about = "Inspect and reconfigure a Caddy server through its admin API",
    version
)]
struct Cli {
    /// Path to console.toml.  Defaults to the platform config directory.
    #[arg(long, env = "CADDY_CONSOLE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// HTTP origin of the Caddy admin endpoint.
    #[arg(long, env = "CADDY_CONSOLE_ORIGIN", global = true)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a default console.toml to the config path.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    #[command(flatten)]
    Admin(AdminCommand),
}

/// Subcommands that talk to the admin endpoint.
#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Print the running configuration as JSON.
    Config,

    /// Replace the running configuration with a JSON document.
    Load {
        /// JSON config file, or `-` for stdin.
        input: PathBuf,
    },

    /// Convert a Caddyfile to JSON without applying it.
    Adapt {
        /// Caddyfile, or `-` for stdin.
        input: PathBuf,
    },

    /// Show reverse-proxy upstreams.
    Upstreams,

    /// Show Prometheus metrics.
    Metrics {
        /// Only series whose name starts with this prefix.
        #[arg(long, value_name = "PREFIX")]
        filter: Option<String>,

        /// Print parsed `series value` rows instead of the raw exposition.
        #[arg(long)]
        parsed: bool,

        /// Re-fetch every SECS seconds until Ctrl+C.
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        watch: Option<u64>,
    },

    /// Show certificate authorities.
    Pki {
        /// Also print the PEM of the root or intermediate certificate.
        #[arg(long, value_name = "root|intermediate")]
        show: Option<CertificatePart>,
    },
}

impl Cli {
    /// Applies flag values on top of the file configuration.
    fn apply(&self, mut config: ConsoleConfig) -> ConsoleConfig {
        if let Some(origin) = &self.origin {
            config.server.origin = origin.clone();
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig { force } = &cli.command {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => config_file_path().context("cannot locate the config directory")?,
        };
        init_config(&path, *force)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let file_config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let config = cli.apply(file_config);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .init();

    let client = AdminClient::from_config(&config.server)
        .context("failed to set up the admin client")?;
    let Command::Admin(command) = cli.command else {
        return Ok(());
    };

    let span = info_span!("admin", origin = %client.origin());
    run(command, &client).instrument(span).await
}

// ── Subcommands ───────────────────────────────────────────────────────────────

async fn run<A: AdminApi + ?Sized>(command: AdminCommand, api: &A) -> anyhow::Result<()> {
    match command {
        AdminCommand::Config => {
            println!("{}", render_json(&api.config().await?));
        }
        AdminCommand::Load { input } => {
            let text = read_input(&input).await?;
            let config = parse_json_config(&text, &input)?;
            let response = api.load(&config).await?;
            debug!(bytes = response.len(), "load accepted");
            println!("Config saved");
        }
        AdminCommand::Adapt { input } => {
            let caddyfile = read_input(&input).await?;
            print!("{}", render_adapt(&api.adapt(&caddyfile).await?));
        }
        AdminCommand::Upstreams => {
            print!("{}", render_upstreams(&api.upstreams().await?));
        }
        AdminCommand::Metrics {
            filter,
            parsed,
            watch,
        } => {
            let filter = filter.as_deref();
            match watch {
                None => print!("{}", format_metrics(&api.metrics().await?, filter, parsed)),
                Some(secs) => {
                    let every = Duration::from_secs(secs);
                    watch_metrics(api, filter, parsed, every, tokio::signal::ctrl_c()).await?
                }
            }
        }
        AdminCommand::Pki { show } => {
            let authorities = PkiService::new(api).certificate_authorities().await?;
            print!("{}", render_pki(&authorities, show));
        }
    }
    Ok(())
}

fn format_metrics(text: &str, filter: Option<&str>, parsed: bool) -> String {
    let shown = render_metrics(text, filter);
    if parsed {
        render_metric_table(&parse_metrics(&shown))
    } else {
        shown
    }
}

/// Polls `/metrics` on a fixed interval until `stop` resolves.  A failed poll
/// is reported and the next one still happens.
///
/// `stop` is created once and raced against both the wait and the fetch, so
/// a signal that arrives while a request is in flight ends the loop.
async fn watch_metrics<A, F>(
    api: &A,
    filter: Option<&str>,
    parsed: bool,
    every: Duration,
    stop: F,
) -> anyhow::Result<()>
where
    A: AdminApi + ?Sized,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(stop);
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut stop => {
                result.context("failed to listen for Ctrl+C")?;
                return Ok(());
            }
        }

        let fetched = tokio::select! {
            fetched = api.metrics() => fetched,
            result = &mut stop => {
                result.context("failed to listen for Ctrl+C")?;
                return Ok(());
            }
        };

        match fetched {
            Ok(text) => {
                println!("── every {}s, Ctrl+C to stop ──", every.as_secs());
                print!("{}", format_metrics(&text, filter, parsed));
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }
}

/// Reads a file, or all of stdin for `-`.
async fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))
}

/// Rejects anything that is not JSON before it reaches the server.
fn parse_json_config(text: &str, source: &Path) -> anyhow::Result<Value> {
    serde_json::from_str(text).with_context(|| format!("{} is not valid JSON", source.display()))
}

/// Writes the default configuration to `path`.
fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", path.display());
    }
    save_config_to(path, &ConsoleConfig::default())
        .with_context(|| format!("failed to write {}", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use console_admin::application::AdminError;
    use console_admin::domain::{AdaptResponse, CertificateAuthority, Upstream};
    use console_core::config::load_config_from;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parse_metrics_subcommand_flags() {
        // Act
        let cli = Cli::parse_from([
            "console-admin",
            "metrics",
            "--filter",
            "caddy_",
            "--parsed",
            "--watch",
            "30",
        ]);

        // Assert
        match cli.command {
            Command::Admin(AdminCommand::Metrics {
                filter,
                parsed,
                watch,
            }) => {
                assert_eq!(filter.as_deref(), Some("caddy_"));
                assert!(parsed);
                assert_eq!(watch, Some(30));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_watch_interval_must_be_positive() {
        let result = Cli::try_parse_from(["console-admin", "metrics", "--watch", "0"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_pki_show_parses_certificate_part() {
        let cli = Cli::parse_from(["console-admin", "pki", "--show", "intermediate"]);

        assert!(matches!(
            cli.command,
            Command::Admin(AdminCommand::Pki {
                show: Some(CertificatePart::Intermediate)
            })
        ));
    }

    #[test]
    fn test_pki_show_rejects_unknown_part() {
        assert!(Cli::try_parse_from(["console-admin", "pki", "--show", "leaf"]).is_err());
    }

    #[test]
    fn test_load_accepts_stdin_marker() {
        let cli = Cli::parse_from(["console-admin", "load", "-"]);

        match cli.command {
            Command::Admin(AdminCommand::Load { input }) => assert_eq!(input, Path::new("-")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_origin_flag_after_subcommand_overrides_file() {
        let cli = Cli::parse_from(["console-admin", "config", "--origin", "http://10.0.0.2:2019"]);

        let config = cli.apply(ConsoleConfig::default());

        assert_eq!(config.server.origin, "http://10.0.0.2:2019");
    }

    #[test]
    fn test_parse_json_config_rejects_caddyfile_text() {
        let result = parse_json_config("example.com {\n  respond \"hi\"\n}\n", Path::new("Caddyfile"));

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.starts_with("Caddyfile is not valid JSON"));
    }

    #[test]
    fn test_format_metrics_parsed_applies_filter_first() {
        let text = "# TYPE up gauge\nup 1\ncaddy_x 2\n";

        assert_eq!(format_metrics(text, Some("caddy_"), true), "caddy_x  2\n");
        assert_eq!(format_metrics(text, None, false), text);
    }

    /// Serves `/metrics` after a fixed delay and counts the requests.
    struct SlowMetrics {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl SlowMetrics {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    fn unused() -> AdminError {
        AdminError::Status {
            endpoint: "unused".to_string(),
            status: 500,
            body: String::new(),
        }
    }

    #[async_trait]
    impl AdminApi for SlowMetrics {
        async fn config(&self) -> Result<Value, AdminError> {
            Err(unused())
        }

        async fn load(&self, _config: &Value) -> Result<String, AdminError> {
            Err(unused())
        }

        async fn adapt(&self, _caddyfile: &str) -> Result<AdaptResponse, AdminError> {
            Err(unused())
        }

        async fn upstreams(&self) -> Result<Vec<Upstream>, AdminError> {
            Err(unused())
        }

        async fn metrics(&self) -> Result<String, AdminError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok("up 1\n".to_string())
        }

        async fn certificate_authorities(&self) -> Result<BTreeMap<String, Value>, AdminError> {
            Err(unused())
        }

        async fn certificate_authority(&self, _id: &str) -> Result<CertificateAuthority, AdminError> {
            Err(unused())
        }
    }

    async fn stop_after(delay: Duration) -> std::io::Result<()> {
        tokio::time::sleep(delay).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_stops_while_a_fetch_is_in_flight() {
        // Arrange: the first fetch takes far longer than the stop signal.
        let api = SlowMetrics::new(Duration::from_secs(30));
        let stop = stop_after(Duration::from_millis(200));

        // Act
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            watch_metrics(&api, None, false, Duration::from_secs(1), stop),
        )
        .await;

        // Assert
        let finished = result.expect("watch should end when stopped mid-fetch");
        assert!(finished.is_ok());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_stops_while_waiting_for_next_tick() {
        // Arrange: fetches are instant; the interval is long.
        let api = SlowMetrics::new(Duration::ZERO);
        let stop = stop_after(Duration::from_millis(200));

        // Act
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            watch_metrics(&api, Some("up"), true, Duration::from_secs(60), stop),
        )
        .await;

        // Assert
        assert!(result.expect("watch should end between ticks").is_ok());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_reports_stop_listener_failure() {
        let api = SlowMetrics::new(Duration::ZERO);
        let stop = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signals")) };

        let result = watch_metrics(&api, None, false, Duration::from_secs(60), stop).await;

        assert!(result.is_err());
    }

    #[test]
    fn test_init_config_writes_defaults_and_refuses_overwrite() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("console.toml");

        // Act
        let first = init_config(&path, false);
        let second = init_config(&path, false);
        let forced = init_config(&path, true);

        // Assert
        assert!(first.is_ok());
        assert!(second.is_err());
        assert!(forced.is_ok());
        assert_eq!(load_config_from(&path).unwrap(), ConsoleConfig::default());
    }
}
