// ── Consumer records ──
//
// Service instances declare interest in generated configuration through
// a flexible attribute store. The publisher writes into one attribute
// slot per consumer and bumps both timestamps on every write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// A downstream consumer of the derived document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

/// A keyed attribute slot owned by a service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceAttribute {
    pub id: EntityId,
    pub service_instance_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl ServiceInstanceAttribute {
    /// Whether this attribute is an interest marker listing `capability`.
    ///
    /// The marker value is a comma-separated capability list.
    pub fn lists_capability(&self, marker: &str, capability: &str) -> bool {
        self.name == marker && self.value.split(',').any(|c| c.trim() == capability)
    }
}
