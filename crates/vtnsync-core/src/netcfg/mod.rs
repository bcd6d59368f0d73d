// ── VTN network configuration ──
//
// Document model, canonical rendering, and derivation from the store.

mod derive;
mod document;

pub use derive::{
    Derivation, SkipReason, SkippedItem, TAG_BRIDGE_ID, TAG_DATA_PLANE_INTF, TAG_DATA_PLANE_IP,
    TAG_HOST_MANAGEMENT_IFACE, derive, normalize_controller_port,
};
pub use document::{
    Apps, ConfigDocument, CordVtn, NetworkConfig, NodeDescriptor, OpenStack, PublicGateway, Ssh,
    VtnApp, Xos,
};
