// ── Core error types ──
//
// `StoreError` and `ResolveError` come from the external collaborators
// (state store, name resolution). `CoreError` is what a reconciliation run
// surfaces to its caller: fatal preconditions and accumulated publish
// failures. Per-item problems during derivation never become errors; they
// are logged and reported as skipped items.

use thiserror::Error;

use crate::model::{EntityId, EntityKind};
use crate::publish::{PublishFailure, PublishReport};

/// Failure reported by a repository.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("write to {kind} {id} rejected: {reason}")]
    Rejected {
        kind: EntityKind,
        id: EntityId,
        reason: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Host name resolution failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unable to resolve hostname {host}: {reason}")]
    Lookup { host: String, reason: String },

    #[error("hostname {host} has no IPv4 address")]
    NoAddress { host: String },
}

/// Unified error type for a reconciliation run.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fatal preconditions ─────────────────────────────────────────
    #[error("no VTN service record exists")]
    NoServiceConfig,

    #[error("expected exactly one VTN service record, found {count}")]
    AmbiguousServiceConfig { count: usize },

    #[error("controller port {value:?} is malformed: {reason}")]
    InvalidControllerPort { value: String, reason: String },

    #[error("controller port host could not be resolved: {0}")]
    ControllerUnresolvable(#[source] ResolveError),

    // ── Collaborator errors ─────────────────────────────────────────
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to serialize network configuration: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Publish ─────────────────────────────────────────────────────
    #[error("publishing failed for {} of {} consumers", failures.len(), report.attempted)]
    Publish {
        report: PublishReport,
        failures: Vec<PublishFailure>,
    },

    // ── Internal errors ─────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether this error aborted the run before anything was published.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoServiceConfig
                | Self::AmbiguousServiceConfig { .. }
                | Self::InvalidControllerPort { .. }
                | Self::ControllerUnresolvable(_)
        )
    }
}
