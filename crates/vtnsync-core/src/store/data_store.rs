// ── In-memory inventory store ──
//
// Thread-safe storage for every entity kind the synchronizer touches.
// Effective mutations are announced on a broadcast channel, which is what
// the watch bridge listens to.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::trace;

use super::collection::{EntityCollection, Upsert};
use super::repository::{
    AddressPoolRepository, ConsumerRepository, ControllerRepository, NodeRepository,
    ServiceConfigRepository, TagRepository,
};
use crate::error::StoreError;
use crate::model::{
    AddressPool, Controller, EntityId, EntityKind, Node, ServiceInstance,
    ServiceInstanceAttribute, Tag, TagOwner, VtnService,
};

const CHANGE_CHANNEL_SIZE: usize = 256;

// ── Change notifications ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

/// A single effective mutation of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityChange {
    pub kind: EntityKind,
    pub id: EntityId,
    pub op: ChangeOp,
}

// ── StoredEntity ─────────────────────────────────────────────────

/// An entity type the `DataStore` holds a collection for.
pub trait StoredEntity: Clone + PartialEq + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    #[doc(hidden)]
    fn collection(store: &DataStore) -> &EntityCollection<Self>;
}

macro_rules! stored_entity {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl StoredEntity for $ty {
            const KIND: EntityKind = EntityKind::$kind;

            fn id(&self) -> &EntityId {
                &self.id
            }

            fn collection(store: &DataStore) -> &EntityCollection<Self> {
                &store.$field
            }
        }
    };
}

stored_entity!(VtnService, VtnService, vtn_services);
stored_entity!(Node, Node, nodes);
stored_entity!(AddressPool, AddressPool, address_pools);
stored_entity!(Controller, Controller, controllers);
stored_entity!(Tag, Tag, tags);
stored_entity!(ServiceInstance, ServiceInstance, service_instances);
stored_entity!(ServiceInstanceAttribute, ServiceInstanceAttribute, attributes);

// ── DataStore ────────────────────────────────────────────────────

/// Central in-memory store for all synchronizer entities.
///
/// Reads are snapshot-based and never block writers for long: each
/// collection hands out an `Arc` of its current contents.
pub struct DataStore {
    pub(crate) vtn_services: EntityCollection<VtnService>,
    pub(crate) nodes: EntityCollection<Node>,
    pub(crate) address_pools: EntityCollection<AddressPool>,
    pub(crate) controllers: EntityCollection<Controller>,
    pub(crate) tags: EntityCollection<Tag>,
    pub(crate) service_instances: EntityCollection<ServiceInstance>,
    pub(crate) attributes: EntityCollection<ServiceInstanceAttribute>,
    changes: broadcast::Sender<EntityChange>,
}

impl DataStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);

        Self {
            vtn_services: EntityCollection::new(),
            nodes: EntityCollection::new(),
            address_pools: EntityCollection::new(),
            controllers: EntityCollection::new(),
            tags: EntityCollection::new(),
            service_instances: EntityCollection::new(),
            attributes: EntityCollection::new(),
            changes,
        }
    }

    // ── Generic access ───────────────────────────────────────────

    /// Insert or replace an entity, announcing the change if it had any
    /// effect.
    pub fn upsert<T: StoredEntity>(&self, entity: T) -> Upsert {
        let id = entity.id().clone();
        let outcome = T::collection(self).upsert(id.clone(), entity);
        match outcome {
            Upsert::Created => self.announce(T::KIND, id, ChangeOp::Created),
            Upsert::Updated => self.announce(T::KIND, id, ChangeOp::Updated),
            Upsert::Unchanged => {}
        }
        outcome
    }

    pub fn remove<T: StoredEntity>(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = T::collection(self).remove(id);
        if removed.is_some() {
            self.announce(T::KIND, id.clone(), ChangeOp::Deleted);
        }
        removed
    }

    /// Current contents of one collection, ordered by id.
    pub fn snapshot<T: StoredEntity>(&self) -> Arc<Vec<Arc<T>>> {
        T::collection(self).snapshot()
    }

    /// Subscribe to per-entity change notifications across all kinds.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<EntityChange> {
        self.changes.subscribe()
    }

    pub(crate) fn ids<T: StoredEntity>(&self) -> Vec<EntityId> {
        T::collection(self).ids()
    }

    fn announce(&self, kind: EntityKind, id: EntityId, op: ChangeOp) {
        trace!(%kind, %id, ?op, "store change");
        // No receivers is fine: nobody is watching yet.
        let _ = self.changes.send(EntityChange { kind, id, op });
    }

    fn cloned<T: StoredEntity>(&self) -> Vec<T> {
        self.snapshot::<T>().iter().map(|e| (**e).clone()).collect()
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Repository implementations ───────────────────────────────────

impl ServiceConfigRepository for DataStore {
    fn vtn_services(&self) -> Result<Vec<VtnService>, StoreError> {
        Ok(self.cloned())
    }
}

impl NodeRepository for DataStore {
    fn nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.cloned())
    }
}

impl AddressPoolRepository for DataStore {
    fn address_pools(&self) -> Result<Vec<AddressPool>, StoreError> {
        Ok(self.cloned())
    }
}

impl ControllerRepository for DataStore {
    fn controllers(&self) -> Result<Vec<Controller>, StoreError> {
        Ok(self.cloned())
    }
}

impl TagRepository for DataStore {
    fn tag(&self, owner: &TagOwner, name: &str) -> Result<Option<Tag>, StoreError> {
        Ok(self
            .tags
            .snapshot()
            .iter()
            .find(|t| t.owner == *owner && t.name == name)
            .map(|t| (**t).clone()))
    }
}

impl ConsumerRepository for DataStore {
    fn attributes_named(&self, name: &str) -> Result<Vec<ServiceInstanceAttribute>, StoreError> {
        Ok(self
            .attributes
            .snapshot()
            .iter()
            .filter(|a| a.name == name)
            .map(|a| (**a).clone())
            .collect())
    }

    fn service_instance(&self, id: &EntityId) -> Result<Option<ServiceInstance>, StoreError> {
        Ok(self.service_instances.get(id).map(|si| (*si).clone()))
    }

    fn attribute(
        &self,
        instance: &EntityId,
        name: &str,
    ) -> Result<Option<ServiceInstanceAttribute>, StoreError> {
        Ok(self
            .attributes
            .snapshot()
            .iter()
            .find(|a| a.service_instance_id == *instance && a.name == name)
            .map(|a| (**a).clone()))
    }

    fn create_attribute(
        &self,
        instance: &EntityId,
        name: &str,
        value: &str,
    ) -> Result<ServiceInstanceAttribute, StoreError> {
        if self.service_instances.get(instance).is_none() {
            return Err(StoreError::NotFound {
                kind: EntityKind::ServiceInstance,
                id: instance.clone(),
            });
        }

        let attribute = ServiceInstanceAttribute {
            id: EntityId::generate(),
            service_instance_id: instance.clone(),
            name: name.to_owned(),
            value: value.to_owned(),
            updated: Utc::now(),
        };
        self.upsert(attribute.clone());
        Ok(attribute)
    }

    fn update_attribute(&self, attribute: &EntityId, value: &str) -> Result<(), StoreError> {
        let existing = self
            .attributes
            .get(attribute)
            .ok_or_else(|| StoreError::NotFound {
                kind: EntityKind::ServiceInstanceAttribute,
                id: attribute.clone(),
            })?;

        let mut updated = (*existing).clone();
        value.clone_into(&mut updated.value);
        updated.updated = Utc::now();
        self.upsert(updated);
        Ok(())
    }

    fn touch_service_instance(&self, instance: &EntityId) -> Result<(), StoreError> {
        let existing = self
            .service_instances
            .get(instance)
            .ok_or_else(|| StoreError::NotFound {
                kind: EntityKind::ServiceInstance,
                id: instance.clone(),
            })?;

        let mut touched = (*existing).clone();
        touched.updated = Utc::now();
        self.upsert(touched);
        Ok(())
    }
}
