// ── Inventory store ──
//
// Repository traits the reconciler consumes, plus the in-memory reactive
// store that implements them and its on-disk state file.

mod collection;
mod data_store;
mod refresh;
mod repository;
mod snapshot;

pub use collection::Upsert;
pub use data_store::{ChangeOp, DataStore, EntityChange, StoredEntity};
pub use repository::{
    AddressPoolRepository, ConsumerRepository, ControllerRepository, Inventory, NodeRepository,
    ServiceConfigRepository, TagRepository,
};
pub use snapshot::{InventorySnapshot, SnapshotError};
