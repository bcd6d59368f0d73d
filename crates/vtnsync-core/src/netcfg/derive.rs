// ── Config derivation ──
//
// Builds the network configuration from one VTN service record plus the
// node, address-pool, and controller collections. A node or pool with bad
// data is skipped and reported; it never aborts the rest of the document.
// Each collection is read exactly once per derivation.

use std::fmt;

use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use super::document::{
    Apps, ConfigDocument, CordVtn, NetworkConfig, NodeDescriptor, OpenStack, PublicGateway, Ssh,
    VtnApp, Xos,
};
use crate::error::{CoreError, ResolveError};
use crate::model::{AddressPool, Controller, EntityId, EntityKind, Node, TagOwner, VtnService};
use crate::resolve::HostResolver;
use crate::store::{AddressPoolRepository, ControllerRepository, NodeRepository, TagRepository};
use crate::tags::{TagError, TagResolver};

pub const TAG_BRIDGE_ID: &str = "bridgeId";
pub const TAG_DATA_PLANE_INTF: &str = "dataPlaneIntf";
pub const TAG_DATA_PLANE_IP: &str = "dataPlaneIp";
pub const TAG_HOST_MANAGEMENT_IFACE: &str = "hostManagementIface";

// ── Skip reporting ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unresolvable(ResolveError),
    Tag(TagError),
    NoGateway,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable(e) => write!(f, "{e}"),
            Self::Tag(e) => write!(f, "{e}"),
            Self::NoGateway => f.write_str("gateway ip or mac is blank"),
        }
    }
}

/// An item left out of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub kind: EntityKind,
    pub id: EntityId,
    pub name: String,
    pub reason: SkipReason,
}

/// Result of one derivation: the tree, its canonical text, and what was
/// left out.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub config: NetworkConfig,
    pub document: ConfigDocument,
    pub skipped: Vec<SkippedItem>,
}

// ── Controller port ──────────────────────────────────────────────

/// Rewrite `host:port` as `address:port` and a bare `port` as `:port`.
pub fn normalize_controller_port<R>(value: &str, resolver: &R) -> Result<String, CoreError>
where
    R: HostResolver + ?Sized,
{
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::InvalidControllerPort {
            value: value.to_owned(),
            reason: "empty".into(),
        });
    }

    match value.split_once(':') {
        Some(("", port)) => Ok(format!(":{port}")),
        Some((host, port)) => {
            let ip = resolver
                .resolve(host)
                .map_err(CoreError::ControllerUnresolvable)?;
            Ok(format!("{ip}:{port}"))
        }
        None => Ok(format!(":{value}")),
    }
}

// ── Derivation ───────────────────────────────────────────────────

/// Derive the network configuration for `primary` from the current store
/// contents.
pub fn derive<S, R>(store: &S, resolver: &R, primary: &VtnService) -> Result<Derivation, CoreError>
where
    S: NodeRepository + AddressPoolRepository + ControllerRepository + TagRepository + ?Sized,
    R: HostResolver + ?Sized,
{
    let controller_port = normalize_controller_port(&primary.controller_port, resolver)?;
    let mut skipped = Vec::new();

    let openstack = store.controllers()?.first().map(openstack_section);

    let tags = TagResolver::new(store);
    let mut nodes = Vec::new();
    for node in store.nodes()? {
        match describe_node(&node, primary.mgmt_subnet_bits, resolver, &tags) {
            Ok(descriptor) => nodes.push(descriptor),
            Err(reason) => skipped.push(SkippedItem {
                kind: EntityKind::Node,
                id: node.id.clone(),
                name: node.name.clone(),
                reason,
            }),
        }
    }
    nodes.sort();

    let pools = store.address_pools()?;
    if pools.is_empty() {
        info!("no address pools present, not adding public gateways to config");
    }
    let mut public_gateways = Vec::new();
    for pool in &pools {
        match gateway(pool) {
            Some(gw) => public_gateways.push(gw),
            None => {
                info!(pool = %pool.name, id = %pool.id, "gateway ip or mac is blank, skipping address pool");
                skipped.push(SkippedItem {
                    kind: EntityKind::AddressPool,
                    id: pool.id.clone(),
                    name: pool.name.clone(),
                    reason: SkipReason::NoGateway,
                });
            }
        }
    }
    public_gateways.sort();

    let config = NetworkConfig {
        apps: Apps {
            vtn: VtnApp {
                cordvtn: CordVtn {
                    private_gateway_mac: primary.private_gateway_mac.clone(),
                    local_management_ip: primary.local_management_ip.clone(),
                    ovsdb_port: primary.ovsdb_port,
                    ssh: Ssh {
                        ssh_port: primary.ssh_port,
                        ssh_user: primary.ssh_user.clone(),
                        ssh_key_file: primary.ssh_key_file.clone(),
                    },
                    xos: Xos {
                        endpoint: primary.xos_endpoint.clone(),
                        user: primary.xos_user.clone(),
                        password: primary.xos_password.expose_secret().to_owned(),
                    },
                    public_gateways,
                    nodes,
                    controllers: vec![controller_port],
                    openstack,
                },
            },
        },
    };

    let document = config.render()?;
    debug!(
        nodes = config.cordvtn().nodes.len(),
        gateways = config.cordvtn().public_gateways.len(),
        skipped = skipped.len(),
        "derived network configuration"
    );

    Ok(Derivation {
        config,
        document,
        skipped,
    })
}

fn openstack_section(controller: &Controller) -> OpenStack {
    OpenStack {
        endpoint: controller.auth_url.clone(),
        tenant: controller.admin_tenant.clone(),
        user: controller.admin_user.clone(),
        password: controller.admin_password.expose_secret().to_owned(),
    }
}

fn describe_node<S, R>(
    node: &Node,
    mgmt_subnet_bits: u8,
    resolver: &R,
    tags: &TagResolver<'_, S>,
) -> Result<NodeDescriptor, SkipReason>
where
    S: TagRepository + ?Sized,
    R: HostResolver + ?Sized,
{
    let ip = resolver.resolve(&node.name).map_err(|e| {
        warn!(hostname = %node.name, error = %e, "node will not be added to config");
        SkipReason::Unresolvable(e)
    })?;

    let owner = TagOwner::node(node.id.clone());
    let required = |name: &str| {
        tags.required(&owner, name).map_err(|e| {
            error!(hostname = %node.name, error = %e, "not adding node to the VTN configuration");
            SkipReason::Tag(e)
        })
    };
    let bridge_id = required(TAG_BRIDGE_ID)?;
    let data_plane_intf = required(TAG_DATA_PLANE_INTF)?;
    let data_plane_ip = required(TAG_DATA_PLANE_IP)?;

    let host_management_iface = match tags.optional(&owner, TAG_HOST_MANAGEMENT_IFACE) {
        Ok(value) => value,
        Err(e) => {
            error!(hostname = %node.name, error = %e, "not adding node to the VTN configuration");
            return Err(SkipReason::Tag(e));
        }
    };
    if host_management_iface.is_none() {
        debug!(hostname = %node.name, "no {TAG_HOST_MANAGEMENT_IFACE} tag");
    }

    Ok(NodeDescriptor {
        hostname: node.name.clone(),
        host_management_ip: format!("{ip}/{mgmt_subnet_bits}"),
        bridge_id,
        data_plane_intf,
        data_plane_ip,
        host_management_iface,
    })
}

fn gateway(pool: &AddressPool) -> Option<PublicGateway> {
    pool.gateway().map(|(ip, mac)| PublicGateway {
        gateway_ip: ip.to_owned(),
        gateway_mac: mac.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resolve::StaticResolver;
    use std::net::Ipv4Addr;

    fn resolver() -> StaticResolver {
        StaticResolver::default().with_entry("onos", Ipv4Addr::new(10, 0, 0, 5))
    }

    #[test]
    fn bare_port_gets_leading_colon() {
        assert_eq!(normalize_controller_port("9876", &resolver()).unwrap(), ":9876");
    }

    #[test]
    fn host_port_is_resolved() {
        assert_eq!(
            normalize_controller_port("onos:9876", &resolver()).unwrap(),
            "10.0.0.5:9876"
        );
    }

    #[test]
    fn empty_host_keeps_port_only() {
        assert_eq!(normalize_controller_port(":6653", &resolver()).unwrap(), ":6653");
    }

    #[test]
    fn unresolvable_controller_host_is_fatal() {
        let err = normalize_controller_port("nowhere:6653", &resolver()).unwrap_err();
        assert!(matches!(err, CoreError::ControllerUnresolvable(_)));
        assert!(err.is_fatal_precondition());
    }

    #[test]
    fn empty_controller_port_is_fatal() {
        let err = normalize_controller_port("  ", &resolver()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidControllerPort { .. }));
    }

    #[test]
    fn skip_reasons_render_readably() {
        let reason = SkipReason::Tag(TagError::Missing {
            name: TAG_BRIDGE_ID.into(),
        });
        assert_eq!(reason.to_string(), "required tag bridgeId is missing");
        assert_eq!(SkipReason::NoGateway.to_string(), "gateway ip or mac is blank");
    }
}
