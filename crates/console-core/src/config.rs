//! TOML-based configuration shared by the shell client and the admin CLI.
//!
//! Reads and writes [`ConsoleConfig`] to the platform-appropriate file:
//! - Windows:  `%APPDATA%\CaddyConsole\console.toml`
//! - Linux:    `~/.config/caddy-console/console.toml`
//! - macOS:    `~/Library/Application Support/CaddyConsole/console.toml`
//!
//! Both binaries accept `--config <PATH>` to point somewhere else.
//!
//! # File format
//!
//! ```toml
//! [server]
//! origin = "http://localhost:2019"
//! pty_path = "/ws/pty"
//!
//! [shell]
//! reconnect_delay_ms = 3000
//! reconnect_multiplier = 1.0
//! reconnect_max_delay_ms = 3000
//! # reconnect_max_attempts = 10
//!
//! [log]
//! level = "info"
//! ```
//!
//! # Serde default values (for beginners)
//!
//! Every field carries `#[serde(default = "...")]`, so a missing file, an
//! empty file, or a file that only sets `origin` all load successfully.  The
//! absent fields take the values shown above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::reconnect::{PolicyError, ReconnectPolicy};

/// File name of the configuration file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "console.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configured admin origin is not a usable HTTP(S) or WS(S) URL.
    #[error("invalid admin origin {origin:?}: {reason}")]
    InvalidUrl { origin: String, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where the Caddy admin endpoint lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// HTTP origin of the admin API, e.g. `"http://localhost:2019"`.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Path of the terminal WebSocket on that origin.
    #[serde(default = "default_pty_path")]
    pub pty_path: String,
}

/// Reconnect behaviour of the interactive shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    /// Delay before the first reconnect attempt, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Growth factor applied to the delay after each failed attempt.
    #[serde(default = "default_reconnect_multiplier")]
    pub reconnect_multiplier: f64,
    /// Upper bound on the delay, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Give up after this many consecutive failed attempts.  Absent = never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_max_attempts: Option<u32>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing` level or filter directive: `"error"`, `"warn"`, `"info"`,
    /// `"debug"`, `"trace"`, or e.g. `"console_shell=debug"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_origin() -> String {
    "http://localhost:2019".to_string()
}
fn default_pty_path() -> String {
    "/ws/pty".to_string()
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}
fn default_reconnect_multiplier() -> f64 {
    1.0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            pty_path: default_pty_path(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reconnect_multiplier: default_reconnect_multiplier(),
            reconnect_max_delay_ms: default_reconnect_delay_ms(),
            reconnect_max_attempts: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl ServerConfig {
    /// Parses the configured origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the origin does not parse or is
    /// not an `http`, `https`, `ws` or `wss` URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin).map_err(|e| self.invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(url),
            other => Err(self.invalid(format!("unsupported scheme {other:?}"))),
        }
    }

    /// Builds the URL of an admin endpoint, e.g. `endpoint("/config/")`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the origin is unusable.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let mut url = self.origin_url()?;
        url.set_path(path);
        Ok(url)
    }

    /// Builds the terminal WebSocket URL: `http` becomes `ws` and `https`
    /// becomes `wss`, with [`pty_path`](Self::pty_path) as the path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the origin is unusable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use console_core::config::ServerConfig;
    ///
    /// let server = ServerConfig {
    ///     origin: "https://admin.example.com:2019".to_string(),
    ///     pty_path: "/ws/pty".to_string(),
    /// };
    /// assert_eq!(server.pty_url().unwrap().as_str(), "wss://admin.example.com:2019/ws/pty");
    /// ```
    pub fn pty_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.endpoint(&self.pty_path)?;
        let ws_scheme = match url.scheme() {
            "http" | "ws" => "ws",
            _ => "wss",
        };
        url.set_scheme(ws_scheme)
            .map_err(|()| self.invalid(format!("cannot switch scheme to {ws_scheme}")))?;
        Ok(url)
    }

    fn invalid(&self, reason: String) -> ConfigError {
        ConfigError::InvalidUrl {
            origin: self.origin.clone(),
            reason,
        }
    }
}

impl ShellConfig {
    /// Converts the stored numbers into a validated [`ReconnectPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the multiplier is below 1.0 or the maximum
    /// delay is shorter than the initial delay.
    pub fn reconnect_policy(&self) -> Result<ReconnectPolicy, PolicyError> {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_delay_ms),
            self.reconnect_multiplier,
            Duration::from_millis(self.reconnect_max_delay_ms),
            self.reconnect_max_attempts,
        )
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the config from `path`, or from the platform default location when
/// `path` is `None`.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig, ConfigError> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config_from(&config_file_path()?),
    }
}

/// Loads a [`ConsoleConfig`] from `path`, returning the defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), "loading config");
            Ok(toml::from_str(&content)?)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(ConsoleConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &ConsoleConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the
/// `caddy-console` / `CaddyConsole` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("CaddyConsole"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("CaddyConsole")
        })
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("caddy-console"))
    }

    #[cfg(not(any(unix, target_os = "windows")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
