// ── Domain model ──
//
// Canonical types for every entity kind the synchronizer reads or writes.

pub mod consumer;
pub mod entity_id;
pub mod inventory;
pub mod service;

pub use consumer::{ServiceInstance, ServiceInstanceAttribute};
pub use entity_id::{EntityId, EntityKind};
pub use inventory::{AddressPool, Node, Tag, TagOwner};
pub use service::{Controller, VtnService};

/// Serde helpers for `SecretString` fields.
///
/// The state file stores credentials in plaintext; in memory they stay
/// wrapped so `Debug` output and logs never carry them.
pub(crate) mod secret {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &SecretString,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.expose_secret())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<SecretString, D::Error> {
        String::deserialize(deserializer).map(SecretString::from)
    }

    pub(crate) fn empty() -> SecretString {
        SecretString::from(String::new())
    }

    pub(crate) fn eq(a: &SecretString, b: &SecretString) -> bool {
        a.expose_secret() == b.expose_secret()
    }
}
