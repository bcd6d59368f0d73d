//! Configuration for the VTN netcfg synchronizer.
//!
//! A flat TOML file layered under `VTNSYNC_*` environment variables, and
//! translation to `vtnsync_core::SyncConfig` plus the static hosts table.
//! The CLI adds flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vtnsync_core::config::{DEFAULT_CAPABILITY, DEFAULT_CHANNEL, DEFAULT_INTEREST_MARKER};
use vtnsync_core::{StaticResolver, SyncConfig, SystemResolver};

/// Prefix for environment overrides, e.g. `VTNSYNC_STATE_FILE`.
pub const ENV_PREFIX: &str = "VTNSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Capability a consumer must list to receive the document.
    #[serde(default = "default_capability")]
    pub capability: String,

    /// Attribute slot the document is written into.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Attribute whose value lists a consumer's capabilities.
    #[serde(default = "default_interest_marker")]
    pub interest_marker: String,

    /// Inventory state file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Quiet period for coalescing change bursts in `watch`.
    #[serde(default = "default_coalesce_ms")]
    pub coalesce_ms: u64,

    /// How often `watch` re-reads the state file.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Use the lowest-id VTN service record when several exist.
    #[serde(default)]
    pub allow_multiple_primary: bool,

    /// Static name resolution, consulted before the system resolver.
    #[serde(default)]
    pub hosts: BTreeMap<String, Ipv4Addr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capability: default_capability(),
            channel: default_channel(),
            interest_marker: default_interest_marker(),
            state_file: None,
            coalesce_ms: default_coalesce_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            allow_multiple_primary: false,
            hosts: BTreeMap::new(),
        }
    }
}

fn default_capability() -> String {
    DEFAULT_CAPABILITY.into()
}
fn default_channel() -> String {
    DEFAULT_CHANNEL.into()
}
fn default_interest_marker() -> String {
    DEFAULT_INTEREST_MARKER.into()
}
fn default_coalesce_ms() -> u64 {
    250
}
fn default_poll_interval_secs() -> u64 {
    5
}

impl Config {
    /// Reject settings the synchronizer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("capability", &self.capability),
            ("channel", &self.channel),
            ("interest_marker", &self.interest_marker),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        if self.capability.contains(',') {
            return Err(ConfigError::Validation {
                field: "capability".into(),
                reason: "must be a single capability name".into(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Translate into the reconciler's runtime configuration.
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            interest_marker: self.interest_marker.clone(),
            capability: self.capability.clone(),
            channel: self.channel.clone(),
            coalesce: Duration::from_millis(self.coalesce_ms),
            allow_multiple_primary: self.allow_multiple_primary,
        }
    }

    /// The hosts table, falling back to the system resolver.
    pub fn resolver(&self) -> StaticResolver {
        let entries = self.hosts.iter().map(|(h, ip)| (h.clone(), *ip)).collect();
        StaticResolver::new(entries).with_fallback(SystemResolver)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Configured state file, or the platform default.
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_path)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "opencord", "vtnsync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the inventory state file.
pub fn default_state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vtnsync");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Layer defaults, the TOML file, and the environment.
///
/// An explicitly given `path` must exist; the default path may be absent.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, or the default path.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, to_toml(cfg)?)?;
    Ok(path)
}

/// Render a config as pretty TOML.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}
