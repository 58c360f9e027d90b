//! Pod and Service derivation
//!
//! Translates a Node into the Pod that runs it and the Service that exposes
//! it. The argument list is deterministic: the same spec and the same static
//! peer resolution always produce the same arguments in the same order.

use crate::config::DEFAULT_RPC_PORT;
use crate::crds::{Node, NodeSpec, Protocol};
use crate::error::TranslationError;
use crate::resolver::ResolvePeer;
use crate::store::NodeKey;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Pod, PodSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{api::ObjectMeta, Resource, ResourceExt};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

pub const APP_LABEL: &str = "wakunode";
pub const CONTAINER_NAME: &str = "wakunode";

/// RPC port inside the container.
pub const RPC_CONTAINER_PORT: i32 = 8548;
/// libp2p port, same inside the container and on the Service.
pub const P2P_PORT: i32 = 60000;
/// RPC port on the Service.
pub const RPC_SERVICE_PORT: i32 = DEFAULT_RPC_PORT as i32;

/// Labels on the Pod, and the Service selector matching them.
pub fn labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), APP_LABEL.to_string()),
        ("node".to_string(), name.to_string()),
    ])
}

/// Arguments that need no I/O, in emission order.
pub fn base_args(name: &str, spec: &NodeSpec) -> Vec<String> {
    let mut args = vec![
        "--rpc=true".to_string(),
        "--rpc-address=0.0.0.0".to_string(),
        format!("--dns4-domain-name={name}"),
    ];

    if spec.metrics {
        args.push("--metrics-server=True".to_string());
        args.push("--metrics-server-address=0.0.0.0".to_string());
    }

    let discv5 = &spec.discv5;
    if discv5.discovery {
        args.push("--discv5-discovery=true".to_string());
    }
    if discv5.enr_auto_update {
        args.push("--discv5-enr-auto-update=True".to_string());
    }
    if !discv5.bootstrap_node.is_empty() {
        args.push(format!("--discv5-bootstrap-node={}", discv5.bootstrap_node));
    }
    if discv5.udp_port != 0 {
        args.push(format!("--discv5-udp-port={}", discv5.udp_port));
    }

    args.extend(protocols(name, &spec.protocols).iter().map(Protocol::flag));

    args
}

/// Known protocols in flag order; unknown tags are logged and dropped.
fn protocols(name: &str, tags: &[String]) -> BTreeSet<Protocol> {
    tags.iter()
        .filter_map(|tag| match tag.parse::<Protocol>() {
            Ok(protocol) => Some(protocol),
            Err(_) => {
                warn!(node = %name, protocol = %tag, "Ignoring unknown protocol");
                None
            }
        })
        .collect()
}

/// Full argument list, resolving the static peer if one is set.
pub async fn node_args(
    node: &Node,
    resolver: &dyn ResolvePeer,
) -> Result<Vec<String>, TranslationError> {
    let key = NodeKey::of(node);
    let mut args = base_args(&key.name, &node.spec);

    if let Some(reference) = node.spec.static_node.as_deref().filter(|r| !r.is_empty()) {
        let address = resolver.resolve(&key, reference).await?;
        args.push(format!("--staticnode={address}"));
    }

    Ok(args)
}

fn metadata(node: &Node, labels: Option<BTreeMap<String, String>>) -> ObjectMeta {
    ObjectMeta {
        name: Some(node.name_any()),
        namespace: node.namespace(),
        labels,
        owner_references: owner_references(node),
        ..Default::default()
    }
}

fn owner_references(node: &Node) -> Option<Vec<OwnerReference>> {
    node.controller_owner_ref(&()).map(|owner| vec![owner])
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port: port,
        ..Default::default()
    }
}

fn service_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        ..Default::default()
    }
}

/// The Pod running `node`. Fails without a partial Pod if the static peer
/// cannot be resolved.
pub async fn pod_from_node(node: &Node, resolver: &dyn ResolvePeer) -> Result<Pod, TranslationError> {
    let args = node_args(node, resolver).await?;

    Ok(Pod {
        metadata: metadata(node, Some(labels(&node.name_any()))),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: CONTAINER_NAME.to_string(),
                image: Some(node.spec.image.clone()),
                args: Some(args),
                ports: Some(vec![
                    container_port("rpc", RPC_CONTAINER_PORT),
                    container_port("p2p", P2P_PORT),
                ]),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    })
}

pub fn service_from_node(node: &Node) -> Service {
    Service {
        metadata: metadata(node, Some(labels(&node.name_any()))),
        spec: Some(ServiceSpec {
            selector: Some(labels(&node.name_any())),
            ports: Some(vec![
                service_port("p2p", P2P_PORT),
                service_port("rpc", RPC_SERVICE_PORT),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
