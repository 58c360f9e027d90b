//! Static peer resolution
//!
//! A static peer reference is either a multiaddr, used verbatim, or the name
//! of a sibling node's Service. In the latter case the sibling is asked for
//! its listen addresses over its JSON-RPC info endpoint and the first one is
//! used.

use crate::config::ResolverConfig;
use crate::error::ResolutionError;
use crate::store::{NodeKey, ObjectStore};
use async_trait::async_trait;
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, info};

/// Turns a static peer reference into a dialable multiaddr.
#[async_trait]
pub trait ResolvePeer: Send + Sync {
    /// `node` is the Node being reconciled; sibling lookups use its namespace.
    async fn resolve(&self, node: &NodeKey, reference: &str) -> Result<String, ResolutionError>;
}

/// Body of the info request. The endpoint takes no arguments.
#[derive(Debug, Default, Serialize)]
pub struct InfoRequest {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoReply {
    pub listen_addresses: Vec<String>,
    #[serde(default)]
    pub enr_uri: Option<String>,
}

/// Resolves references through sibling Services in the object store.
pub struct ServiceResolver {
    store: Arc<dyn ObjectStore>,
    http: reqwest::Client,
    config: ResolverConfig,
}

impl ServiceResolver {
    pub fn new(store: Arc<dyn ObjectStore>, config: ResolverConfig) -> Result<Self, reqwest::Error> {
        // Cluster IPs are never reachable through an egress proxy.
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            store,
            http,
            config,
        })
    }

    fn info_url(&self, cluster_ip: &str) -> String {
        match cluster_ip.parse::<IpAddr>() {
            Ok(ip) => format!("http://{}/", SocketAddr::new(ip, self.config.rpc_port)),
            Err(_) => format!("http://{}:{}/", cluster_ip, self.config.rpc_port),
        }
    }
}

#[async_trait]
impl ResolvePeer for ServiceResolver {
    async fn resolve(&self, node: &NodeKey, reference: &str) -> Result<String, ResolutionError> {
        match reference.parse::<Multiaddr>() {
            Ok(_) => {
                debug!(reference, "Static peer is a multiaddr");
                return Ok(reference.to_string());
            }
            // Service names never contain '/'.
            Err(source) if reference.starts_with('/') => {
                return Err(ResolutionError::InvalidMultiaddr {
                    reference: reference.to_string(),
                    source,
                });
            }
            Err(_) => {}
        }

        let service = self
            .store
            .get_service(&node.sibling(reference))
            .await
            .map_err(|source| ResolutionError::ServiceLookup {
                reference: reference.to_string(),
                source,
            })?;

        let cluster_ip = service
            .spec
            .and_then(|spec| spec.cluster_ip)
            .filter(|ip| !ip.is_empty() && ip != "None")
            .ok_or_else(|| ResolutionError::MissingClusterIp {
                reference: reference.to_string(),
            })?;

        let url = self.info_url(&cluster_ip);
        debug!(reference, url = %url, "Querying sibling node info");

        let response = self
            .http
            .post(&url)
            .json(&InfoRequest::default())
            .send()
            .await
            .map_err(|source| ResolutionError::Request {
                reference: reference.to_string(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                reference: reference.to_string(),
                url,
                status,
            });
        }

        let reply: InfoReply =
            response
                .json()
                .await
                .map_err(|source| ResolutionError::Decode {
                    reference: reference.to_string(),
                    url: url.clone(),
                    source,
                })?;

        let address = reply.listen_addresses.into_iter().next().ok_or_else(|| {
            ResolutionError::NoListenAddresses {
                reference: reference.to_string(),
                url: url.clone(),
            }
        })?;

        info!(reference, address = %address, enr = ?reply.enr_uri, "Resolved static peer");
        Ok(address)
    }
}
