//! Node CRD
//!
//! Defines the Node custom resource describing a desired Waku node.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Node describes one Waku node the operator should run.
///
/// The operator derives a Pod running the node and a Service exposing its
/// RPC and libp2p ports. Both are created once and not updated afterwards.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "waku.vac.dev",
    version = "v1alpha1",
    kind = "Node",
    namespaced,
    printcolumn = r#"{"name":"Image", "type":"string", "jsonPath":".spec.image"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Container image running the node.
    pub image: String,

    /// Expose the metrics server on all interfaces.
    #[serde(default)]
    pub metrics: bool,

    /// Discovery v5 settings.
    #[serde(default)]
    pub discv5: Discv5Config,

    /// Enabled protocols, any of `relay`, `store`, `lightpush`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    /// Static peer: either a multiaddr or the name of a sibling node's
    /// Service in the same namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_node: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discv5Config {
    #[serde(default)]
    pub discovery: bool,

    #[serde(default)]
    pub enr_auto_update: bool,

    /// Passed to the node as-is, never resolved.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bootstrap_node: String,

    /// UDP port for discovery; 0 leaves the node default.
    #[serde(default)]
    pub udp_port: u16,
}

/// Protocols a node can mount. Declaration order is the order flags are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Relay,
    Store,
    Lightpush,
}

impl Protocol {
    /// Command-line flag enabling the protocol.
    pub fn flag(&self) -> String {
        format!("--{self}=true")
    }
}
