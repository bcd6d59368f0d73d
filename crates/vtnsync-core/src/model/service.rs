// ── Service configuration records ──

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::secret;

/// The primary service-configuration record.
///
/// Exactly one must exist when a reconciliation run starts. Its scalar
/// fields are copied verbatim into the derived document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtnService {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub private_gateway_mac: String,
    #[serde(default)]
    pub local_management_ip: String,
    #[serde(default)]
    pub ovsdb_port: u16,
    #[serde(default)]
    pub ssh_port: u16,
    #[serde(default)]
    pub ssh_user: String,
    #[serde(default)]
    pub ssh_key_file: String,
    #[serde(default)]
    pub mgmt_subnet_bits: u8,
    #[serde(default)]
    pub xos_endpoint: String,
    #[serde(default)]
    pub xos_user: String,
    #[serde(
        default = "secret::empty",
        serialize_with = "secret::serialize",
        deserialize_with = "secret::deserialize"
    )]
    pub xos_password: SecretString,
    /// Either a bare `port` or `host:port`.
    pub controller_port: String,
}

impl PartialEq for VtnService {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.private_gateway_mac == other.private_gateway_mac
            && self.local_management_ip == other.local_management_ip
            && self.ovsdb_port == other.ovsdb_port
            && self.ssh_port == other.ssh_port
            && self.ssh_user == other.ssh_user
            && self.ssh_key_file == other.ssh_key_file
            && self.mgmt_subnet_bits == other.mgmt_subnet_bits
            && self.xos_endpoint == other.xos_endpoint
            && self.xos_user == other.xos_user
            && secret::eq(&self.xos_password, &other.xos_password)
            && self.controller_port == other.controller_port
    }
}

/// Credentials and location of the upstream cloud controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    pub auth_url: String,
    pub admin_user: String,
    #[serde(default)]
    pub admin_tenant: String,
    #[serde(
        default = "secret::empty",
        serialize_with = "secret::serialize",
        deserialize_with = "secret::deserialize"
    )]
    pub admin_password: SecretString,
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.auth_url == other.auth_url
            && self.admin_user == other.admin_user
            && self.admin_tenant == other.admin_tenant
            && secret::eq(&self.admin_password, &other.admin_password)
    }
}
