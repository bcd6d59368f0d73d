// ── State file ──
//
// JSON image of the whole store. The CLI loads it before a run and writes
// it back afterwards so published attribute slots persist between
// invocations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    AddressPool, Controller, Node, ServiceInstance, ServiceInstanceAttribute, Tag, VtnService,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read state file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {} is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Every collection of the store, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub vtn_services: Vec<VtnService>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub address_pools: Vec<AddressPool>,
    #[serde(default)]
    pub controllers: Vec<Controller>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub service_instances: Vec<ServiceInstance>,
    #[serde(default)]
    pub attributes: Vec<ServiceInstanceAttribute>,
}

impl InventorySnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the snapshot atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let mut body = serde_json::to_string_pretty(self).map_err(SnapshotError::Encode)?;
        body.push('\n');

        let tmp = path.with_extension("json.tmp");
        let write_err = |source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&tmp, body).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(write_err)
    }
}
