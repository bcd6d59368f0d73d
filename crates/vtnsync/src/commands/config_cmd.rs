//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, ConfigError};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::effective_config_path(global);
            if path.exists() && !force {
                return Err(CliError::Config(ConfigError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists; use --force to overwrite", path.display()),
                }));
            }
            let written = config::save_config(&Config::default(), Some(&path))?;
            eprintln!("wrote {}", written.display());
        }
        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            // Show where the state file actually lives, not just the override.
            cfg.state_file = Some(config::state_path(global, &cfg));
            print!("{}", config::to_toml(&cfg)?);
        }
        ConfigCommand::Path => {
            println!("{}", config::effective_config_path(global).display());
        }
    }
    Ok(())
}
