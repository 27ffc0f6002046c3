//! TOML-based configuration persistence for the DPN console.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\DPNConsole\config.toml`
//! - Linux:    `~/.config/dpnconsole/config.toml`
//! - macOS:    `~/Library/Application Support/DPNConsole/config.toml`
//!
//! # Example file
//!
//! ```toml
//! [console]
//! log_level = "info"
//! identity = "alice@example.com"
//!
//! [network]
//! probe_port = 7070
//! connect_timeout_ms = 3000
//!
//! [pairing]
//! variant_a_pin = "1230"
//! variant_b_pin = "3210"
//!
//! [timing]
//! transfer_tick_ms = 500
//! console_line_ms = 1000
//!
//! [storage]
//! slot_path = "/var/lib/dpn/handoff.json"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or a
//! missing key all fall back to the built-in values.
//!
//! The pairing PINs are the accessory secrets.  They are resolved here at
//! startup (file, then CLI/env overrides in `main`) and handed to the
//! authenticator; no other module contains them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dpn_core::{PairingError, PairingSecrets};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the handoff slot store inside the config directory.
const SLOT_FILE_NAME: &str = "handoff_slot.json";

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

    /// The configured pairing PINs are unusable.
    #[error("invalid pairing configuration: {0}")]
    Pairing(#[from] PairingError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level console configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// General console behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleConfig {
    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Identity the console acts as for handoff slot calls.
    #[serde(default = "default_identity")]
    pub identity: String,
}

/// Settings for the TCP probe networking collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// TCP port probed on the peer address.
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,
    /// How long to wait for the peer before giving up.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Scheme shown in the session endpoint (`tcp://…`).
    #[serde(default = "default_endpoint_scheme")]
    pub endpoint_scheme: String,
}

/// Hardware accessory PIN secrets.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct PairingConfig {
    /// PIN of the TP-Link wired accessory.
    #[serde(default = "default_variant_a_pin")]
    pub variant_a_pin: String,
    /// PIN of the ATTINY85 wireless accessory.
    #[serde(default = "default_variant_b_pin")]
    pub variant_b_pin: String,
}

/// Timer cadences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_transfer_tick_ms")]
    pub transfer_tick_ms: u64,
    #[serde(default = "default_console_line_ms")]
    pub console_line_ms: u64,
}

/// Location of the persisted handoff slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Overrides the default `<config dir>/handoff_slot.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_path: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_identity() -> String {
    "operator@localhost".to_string()
}
fn default_probe_port() -> u16 {
    7070
}
fn default_connect_timeout_ms() -> u64 {
    3000
}
fn default_endpoint_scheme() -> String {
    "tcp".to_string()
}
fn default_variant_a_pin() -> String {
    "1230".to_string()
}
fn default_variant_b_pin() -> String {
    "3210".to_string()
}
fn default_transfer_tick_ms() -> u64 {
    500
}
fn default_console_line_ms() -> u64 {
    1000
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            identity: default_identity(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_port: default_probe_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            endpoint_scheme: default_endpoint_scheme(),
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            variant_a_pin: default_variant_a_pin(),
            variant_b_pin: default_variant_b_pin(),
        }
    }
}

// Secrets stay out of `{:?}` output and therefore out of logs.
impl std::fmt::Debug for PairingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingConfig")
            .field("variant_a_pin", &"****")
            .field("variant_b_pin", &"****")
            .finish()
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transfer_tick_ms: default_transfer_tick_ms(),
            console_line_ms: default_console_line_ms(),
        }
    }
}

impl AppConfig {
    /// Validated pairing secrets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pairing`] if a PIN is not exactly four
    /// characters or both PINs are equal.
    pub fn pairing_secrets(&self) -> Result<PairingSecrets, ConfigError> {
        Ok(PairingSecrets::new(
            self.pairing.variant_a_pin.clone(),
            self.pairing.variant_b_pin.clone(),
        )?)
    }

    pub fn transfer_tick(&self) -> Duration {
        Duration::from_millis(self.timing.transfer_tick_ms)
    }

    pub fn console_line_period(&self) -> Duration {
        Duration::from_millis(self.timing.console_line_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms)
    }

    /// Path of the handoff slot file: the configured override, or
    /// `handoff_slot.json` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when no override is set
    /// and the platform directory is unknown.
    pub fn slot_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.slot_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join(SLOT_FILE_NAME)),
        }
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

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning defaults if the
/// file does not exist yet.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
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

/// Resolves the platform config base directory including the `DPNConsole`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DPNConsole"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("dpnconsole"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DPNConsole")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
