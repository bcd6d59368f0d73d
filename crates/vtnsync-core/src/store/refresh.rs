// ── Full snapshot application ──
//
// Loads a state-file image into the DataStore. Only effective changes are
// announced, so reloading an unchanged file produces no watch traffic.

use std::collections::HashSet;

use super::data_store::{DataStore, StoredEntity};
use super::snapshot::InventorySnapshot;
use crate::model::{
    AddressPool, Controller, EntityId, Node, ServiceInstance, ServiceInstanceAttribute, Tag,
    VtnService,
};

/// Upsert all incoming entities, then prune any existing ids not in the
/// incoming set. This avoids the brief empty state a clear would cause.
fn upsert_and_prune<T: StoredEntity>(store: &DataStore, items: Vec<T>) {
    let incoming: HashSet<EntityId> = items.iter().map(|e| e.id().clone()).collect();
    for entity in items {
        store.upsert(entity);
    }
    for existing in store.ids::<T>() {
        if !incoming.contains(&existing) {
            store.remove::<T>(&existing);
        }
    }
}

impl DataStore {
    /// Replace the store contents with `snap`.
    pub fn apply_snapshot(&self, snap: InventorySnapshot) {
        // Consumers first, so attribute slots never point at a missing
        // instance for longer than necessary.
        upsert_and_prune::<ServiceInstance>(self, snap.service_instances);
        upsert_and_prune::<ServiceInstanceAttribute>(self, snap.attributes);
        upsert_and_prune::<Controller>(self, snap.controllers);
        upsert_and_prune::<Tag>(self, snap.tags);
        upsert_and_prune::<AddressPool>(self, snap.address_pools);
        upsert_and_prune::<Node>(self, snap.nodes);
        upsert_and_prune::<VtnService>(self, snap.vtn_services);
    }

    /// Capture the current store contents.
    pub fn to_snapshot(&self) -> InventorySnapshot {
        fn all<T: StoredEntity>(store: &DataStore) -> Vec<T> {
            store.snapshot::<T>().iter().map(|e| (**e).clone()).collect()
        }

        InventorySnapshot {
            vtn_services: all(self),
            nodes: all(self),
            address_pools: all(self),
            controllers: all(self),
            tags: all(self),
            service_instances: all(self),
            attributes: all(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use crate::store::ChangeOp;

    fn node(id: u64, name: &str) -> Node {
        Node {
            id: EntityId::from(id),
            name: name.into(),
        }
    }

    #[test]
    fn apply_prunes_missing_entities() {
        let store = DataStore::new();
        store.upsert(node(1, "compute-1"));
        store.upsert(node(2, "compute-2"));

        store.apply_snapshot(InventorySnapshot {
            nodes: vec![node(2, "compute-2"), node(3, "compute-3")],
            ..InventorySnapshot::default()
        });

        let ids: Vec<EntityId> = store.snapshot::<Node>().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, [EntityId::from(2), EntityId::from(3)]);
    }

    #[test]
    fn reapplying_identical_snapshot_is_silent() {
        let store = DataStore::new();
        let snap = InventorySnapshot {
            nodes: vec![node(1, "compute-1")],
            ..InventorySnapshot::default()
        };
        store.apply_snapshot(snap.clone());

        let mut rx = store.subscribe_changes();
        store.apply_snapshot(snap);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn apply_announces_deletes() {
        let store = DataStore::new();
        store.upsert(node(1, "compute-1"));
        let mut rx = store.subscribe_changes();

        store.apply_snapshot(InventorySnapshot::default());

        let change = rx.try_recv().unwrap_or_else(|e| panic!("expected a change: {e}"));
        assert_eq!(change.kind, EntityKind::Node);
        assert_eq!(change.op, ChangeOp::Deleted);
    }

    #[test]
    fn to_snapshot_round_trips_through_apply() {
        let store = DataStore::new();
        store.upsert(node(1, "compute-1"));
        let snap = store.to_snapshot();

        let other = DataStore::new();
        other.apply_snapshot(snap.clone());
        assert_eq!(other.to_snapshot(), snap);
    }
}
