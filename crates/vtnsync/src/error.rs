//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vtnsync_config::ConfigError;
use vtnsync_core::{CoreError, SnapshotError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const PRECONDITION: i32 = 3;
    pub const PUBLISH: i32 = 4;
    pub const CONFIG: i32 = 5;
    pub const STATE: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(vtnsync::config),
        help("Check the configuration file; `vtnsync config path` shows where it is read from.")
    )]
    Config(#[from] ConfigError),

    // ── State file ───────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(vtnsync::state),
        help(
            "The state file is a JSON inventory snapshot.\n\
             Pass --state <path> or set state_file in the configuration."
        )
    )]
    State(#[from] SnapshotError),

    // ── Reconciliation ───────────────────────────────────────────────

    #[error("reconciliation precondition failed")]
    #[diagnostic(
        code(vtnsync::precondition),
        help(
            "Exactly one VTN service record must exist, and its controller_port must be\n\
             `port` or `host:port` with a resolvable host. Nothing was published."
        )
    )]
    Precondition(#[source] CoreError),

    #[error("publishing failed for {failed} of {attempted} consumers")]
    #[diagnostic(code(vtnsync::publish), help("{details}"))]
    PublishFailed {
        failed: usize,
        attempted: usize,
        details: String,
    },

    #[error("reconciliation failed")]
    #[diagnostic(code(vtnsync::reconcile))]
    Core(#[source] CoreError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    #[diagnostic(code(vtnsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::State(_) => exit_code::STATE,
            Self::Precondition(_) => exit_code::PRECONDITION,
            Self::PublishFailed { .. } => exit_code::PUBLISH,
            Self::Core(_) | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            err if err.is_fatal_precondition() => Self::Precondition(err),
            CoreError::Publish { report, failures } => Self::PublishFailed {
                failed: failures.len(),
                attempted: report.attempted,
                details: failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            other => Self::Core(other),
        }
    }
}
