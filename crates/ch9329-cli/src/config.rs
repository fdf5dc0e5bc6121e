//! TOML configuration file for connection and typing defaults.
//!
//! Everything in the file is optional; command-line flags and `CH9329_*`
//! environment variables override it. Example:
//!
//! ```toml
//! [connection]
//! port = "/dev/ttyUSB0"
//! baud = 9600
//! timeout_ms = 500
//!
//! [typing]
//! min_interval_ms = 10
//! max_interval_ms = 30
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file consulted when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ch9329.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
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
}

// ── Config schema types ─────────────────────────────────────────────────────

/// Top-level configuration read from disk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub typing: TypingConfig,
}

/// Serial connection settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    /// Serial port path, e.g. `/dev/ttyUSB0` or `COM3`.
    #[serde(default)]
    pub port: Option<String>,
    /// UART baud rate. The chip ships configured for 9600.
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Read and write timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Jitter bounds for typed keystrokes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TypingConfig {
    /// Shortest keypress hold and inter-key pause in milliseconds.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Longest keypress hold and inter-key pause in milliseconds.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

// ── Default helpers ─────────────────────────────────────────────────────────

fn default_baud() -> u32 {
    9600
}
fn default_timeout_ms() -> u64 {
    500
}
fn default_min_interval_ms() -> u64 {
    10
}
fn default_max_interval_ms() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            typing: TypingConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Loads configuration from `path`, returning the defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for file-system errors other than "not
    /// found", and [`ConfigError::Parse`] if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Loads configuration from `path`, requiring the file to exist.
    ///
    /// Unlike [`AppConfig::load`], a missing file is reported instead of
    /// falling back to the defaults, so a typoed path does not pass
    /// silently.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for any file-system error, "not found"
    /// included, and [`ConfigError::Parse`] if the TOML is malformed.
    pub fn load_required(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
