//! CLI configuration: thin wrapper around `vtnsync_config` that respects
//! `GlobalOpts` flag overrides (--config, --state).

use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vtnsync_config::{Config, ConfigError, config_path, load_config, save_config, to_toml};

/// Load the configuration named by `--config`, or the default one.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config(global.config.as_deref())?)
}

/// The config file in effect for this invocation.
pub fn effective_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// State file location: flag > config > platform default.
pub fn state_path(global: &GlobalOpts, config: &Config) -> PathBuf {
    global.state.clone().unwrap_or_else(|| config.state_path())
}
