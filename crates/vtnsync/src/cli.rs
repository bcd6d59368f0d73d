//! Clap derive structures for the `vtnsync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vtnsync -- keep the VTN network configuration in step with inventory
#[derive(Debug, Parser)]
#[command(
    name = "vtnsync",
    version,
    about = "Derive the VTN network configuration and publish it to interested consumers",
    long_about = "Derives the ONOS VTN network configuration document from the inventory \
        state file and publishes it to every service instance that asks for it.\n\n\
        Runs are level-triggered: each one recomputes the whole document and only \
        writes where a consumer's stored copy differs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "VTNSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Inventory state file (overrides `state_file` from the config)
    #[arg(long, short = 's', global = true)]
    pub state: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Derive the document and print it without publishing
    Render(RenderArgs),

    /// Run one reconciliation and write the state file back
    Sync(SyncArgs),

    /// Reconcile continuously as the state file changes
    Watch(WatchArgs),

    /// Inspect or create configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Write the document to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Reconcile in memory only; leave the state file untouched
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between state file reloads (overrides `poll_interval_secs`)
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the effective configuration as TOML
    Show,

    /// Print the configuration file path
    Path,
}
