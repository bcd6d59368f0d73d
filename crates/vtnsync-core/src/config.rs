// ── Runtime synchronizer configuration ──
//
// Describes *what* the reconciler manages and how eagerly it reacts.
// Never touches disk: the CLI loads a file and hands this in.

use std::time::Duration;

/// Interest-marker attribute name scanned to discover consumers.
pub const DEFAULT_INTEREST_MARKER: &str = "autogenerate";
/// Capability a consumer must list to receive the document.
pub const DEFAULT_CAPABILITY: &str = "vtn-network-cfg";
/// Attribute slot the document is published into.
pub const DEFAULT_CHANNEL: &str = "rest_onos/v1/network/configuration/";

/// Configuration for a single reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Attribute name whose value lists the capabilities a consumer wants.
    pub interest_marker: String,
    /// Capability this synchronizer manages.
    pub capability: String,
    /// Attribute slot written on each interested consumer.
    pub channel: String,
    /// Quiet period used to coalesce bursts of change notifications.
    pub coalesce: Duration,
    /// Pick the first VTN service record by id instead of failing when
    /// several exist.
    pub allow_multiple_primary: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interest_marker: DEFAULT_INTEREST_MARKER.into(),
            capability: DEFAULT_CAPABILITY.into(),
            channel: DEFAULT_CHANNEL.into(),
            coalesce: Duration::from_millis(250),
            allow_multiple_primary: false,
        }
    }
}
