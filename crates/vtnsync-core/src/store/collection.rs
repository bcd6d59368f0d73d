// ── Generic reactive entity collection ──
//
// Concurrent storage keyed by EntityId. The ordered snapshot lives in a
// `watch` channel so readers get a cheap `Arc` without holding map locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntityId;

/// Outcome of an upsert, used to decide whether to announce a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
    Unchanged,
}

/// A concurrent, reactive collection for a single entity kind.
///
/// Every effective mutation rebuilds the snapshot readers see.
/// Snapshots are ordered by id so iteration order is stable across runs.
pub struct EntityCollection<T: Clone + PartialEq + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Arc<T>>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace an entity. Writing an identical value is a no-op.
    pub(crate) fn upsert(&self, id: EntityId, entity: T) -> Upsert {
        let outcome = match self.by_id.get(&id) {
            Some(existing) if **existing == entity => return Upsert::Unchanged,
            Some(_) => Upsert::Updated,
            None => Upsert::Created,
        };

        self.by_id.insert(id, Arc::new(entity));
        self.rebuild_snapshot();
        outcome
    }

    /// Remove an entity. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.by_id.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(EntityId, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
