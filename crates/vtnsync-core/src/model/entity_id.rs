// ── Core identity types ──
//
// EntityId and EntityKind identify every record the store holds. Change
// notifications and skip reports carry both.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for any stored entity.
///
/// Inventory records carry the numeric primary keys of the upstream data
/// model; records the store creates itself get a UUID. Anything else is
/// kept verbatim.
///
/// Deserialization accepts JSON numbers and strings, and classifies
/// strings exactly like `From<String>`, so `"7"` and `7` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(u64),
    Uuid(Uuid),
    Named(String),
}

impl EntityId {
    /// Fresh store-assigned identifier.
    pub fn generate() -> Self {
        Self::Uuid(Uuid::new_v4())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Named(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Numeric(n)
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        if let Ok(n) = s.parse::<u64>() {
            return Self::Numeric(n);
        }
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Named(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a string id")
            }

            fn visit_u64<E: de::Error>(self, n: u64) -> Result<EntityId, E> {
                Ok(EntityId::Numeric(n))
            }

            fn visit_i64<E: de::Error>(self, n: i64) -> Result<EntityId, E> {
                u64::try_from(n)
                    .map(EntityId::Numeric)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(n), &self))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<EntityId, E> {
                Ok(EntityId::from(s))
            }

            fn visit_string<E: de::Error>(self, s: String) -> Result<EntityId, E> {
                Ok(EntityId::from(s))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

// ── EntityKind ──────────────────────────────────────────────────────

/// Every entity kind the store knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "PascalCase")]
pub enum EntityKind {
    VtnService,
    Node,
    AddressPool,
    Controller,
    Tag,
    ServiceInstance,
    ServiceInstanceAttribute,
}

impl EntityKind {
    /// Kinds whose create/update/delete triggers a reconciliation run.
    pub const WATCHED: [Self; 3] = [Self::VtnService, Self::Node, Self::AddressPool];

    pub fn is_watched(self) -> bool {
        Self::WATCHED.contains(&self)
    }
}
