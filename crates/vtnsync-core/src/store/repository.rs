// ── Repository interfaces ──
//
// One narrow trait per entity kind the reconciler consumes. The
// reconciler is generic over `Inventory`, so tests can substitute
// in-memory fakes or wrap the `DataStore` to inject failures.

use crate::error::StoreError;
use crate::model::{
    AddressPool, Controller, EntityId, Node, ServiceInstance, ServiceInstanceAttribute, Tag,
    TagOwner, VtnService,
};

/// Primary service-configuration records.
pub trait ServiceConfigRepository {
    fn vtn_services(&self) -> Result<Vec<VtnService>, StoreError>;
}

pub trait NodeRepository {
    fn nodes(&self) -> Result<Vec<Node>, StoreError>;
}

pub trait AddressPoolRepository {
    fn address_pools(&self) -> Result<Vec<AddressPool>, StoreError>;
}

pub trait ControllerRepository {
    fn controllers(&self) -> Result<Vec<Controller>, StoreError>;
}

pub trait TagRepository {
    /// Look up the tag `name` attached to `owner`. `Ok(None)` means the
    /// tag does not exist; `Err` means the lookup itself failed.
    fn tag(&self, owner: &TagOwner, name: &str) -> Result<Option<Tag>, StoreError>;
}

/// Consumer discovery and the attribute slots the publisher writes.
pub trait ConsumerRepository {
    /// All attributes carrying `name`, across every service instance.
    fn attributes_named(&self, name: &str) -> Result<Vec<ServiceInstanceAttribute>, StoreError>;

    fn service_instance(&self, id: &EntityId) -> Result<Option<ServiceInstance>, StoreError>;

    /// The attribute `name` owned by `instance`, if any.
    fn attribute(
        &self,
        instance: &EntityId,
        name: &str,
    ) -> Result<Option<ServiceInstanceAttribute>, StoreError>;

    fn create_attribute(
        &self,
        instance: &EntityId,
        name: &str,
        value: &str,
    ) -> Result<ServiceInstanceAttribute, StoreError>;

    /// Overwrite an attribute value, bumping its `updated` timestamp.
    fn update_attribute(&self, attribute: &EntityId, value: &str) -> Result<(), StoreError>;

    /// Bump a service instance's `updated` timestamp.
    fn touch_service_instance(&self, instance: &EntityId) -> Result<(), StoreError>;
}

/// Everything a reconciliation run reads or writes.
pub trait Inventory:
    ServiceConfigRepository
    + NodeRepository
    + AddressPoolRepository
    + ControllerRepository
    + TagRepository
    + ConsumerRepository
    + Send
    + Sync
{
}

impl<T> Inventory for T where
    T: ServiceConfigRepository
        + NodeRepository
        + AddressPoolRepository
        + ControllerRepository
        + TagRepository
        + ConsumerRepository
        + Send
        + Sync
{
}
