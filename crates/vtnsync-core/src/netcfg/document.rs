// ── Network configuration document ──
//
// The JSON tree pushed to ONOS as `apps."org.opencord.vtn".cordvtn`, and
// its canonical text form. Change detection compares the text byte for
// byte, so rendering must be fully deterministic: keys sorted at every
// level, four-space indentation, list contents ordered by the deriver.

use std::fmt;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub apps: Apps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Apps {
    #[serde(rename = "org.opencord.vtn")]
    pub vtn: VtnApp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VtnApp {
    pub cordvtn: CordVtn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CordVtn {
    pub private_gateway_mac: String,
    pub local_management_ip: String,
    pub ovsdb_port: u16,
    pub ssh: Ssh,
    pub xos: Xos,
    pub public_gateways: Vec<PublicGateway>,
    pub nodes: Vec<NodeDescriptor>,
    pub controllers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openstack: Option<OpenStack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ssh {
    pub ssh_port: u16,
    pub ssh_user: String,
    pub ssh_key_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Xos {
    pub endpoint: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenStack {
    pub endpoint: String,
    pub tenant: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub hostname: String,
    pub host_management_ip: String,
    pub bridge_id: String,
    pub data_plane_intf: String,
    pub data_plane_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_management_iface: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicGateway {
    pub gateway_ip: String,
    pub gateway_mac: String,
}

// ── Canonical text ───────────────────────────────────────────────

/// The rendered document, as compared against and written to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigDocument(String);

impl ConfigDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
impl ConfigDocument {
    pub(crate) fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl NetworkConfig {
    pub fn cordvtn(&self) -> &CordVtn {
        &self.apps.vtn.cordvtn
    }

    /// Render with sorted keys and four-space indentation.
    pub fn render(&self) -> Result<ConfigDocument, serde_json::Error> {
        let value = canonicalize(serde_json::to_value(self)?);

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;

        // serde_json only ever emits UTF-8.
        Ok(ConfigDocument(String::from_utf8_lossy(&buf).into_owned()))
    }
}

/// Rebuild every object with its keys in sorted order, whatever map
/// implementation serde_json was compiled with.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
