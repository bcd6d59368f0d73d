// ── Inventory records ──
//
// Nodes and address pools are created and deleted by an external
// inventory process. Tags carry side-band deployment facts about them.

use serde::{Deserialize, Serialize};

use super::entity_id::{EntityId, EntityKind};

/// A compute node. Its address is resolved from `name` on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub name: String,
}

/// An address pool, optionally carrying a public gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPool {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub gateway_mac: Option<String>,
}

impl AddressPool {
    /// The `(ip, mac)` gateway pair, if both halves are present and non-empty.
    pub fn gateway(&self) -> Option<(&str, &str)> {
        let ip = self.gateway_ip.as_deref().filter(|s| !s.is_empty())?;
        let mac = self.gateway_mac.as_deref().filter(|s| !s.is_empty())?;
        Some((ip, mac))
    }
}

/// The entity a tag is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagOwner {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl TagOwner {
    pub fn node(id: EntityId) -> Self {
        Self {
            kind: EntityKind::Node,
            id,
        }
    }
}

/// A named, owner-scoped scalar fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub owner: TagOwner,
    pub name: String,
    pub value: String,
}
