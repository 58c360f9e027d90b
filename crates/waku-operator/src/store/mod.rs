//! Object store access
//!
//! The reconciler reads and creates objects through [`ObjectStore`] so that
//! Kubernetes failures arrive as typed [`StoreError`]s and tests can run
//! against an in-memory store.

#[cfg(test)]
pub(crate) mod memory;

use crate::crds::Node;
use crate::error::StoreError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, PostParams},
    Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::{self, Debug};

/// Identity shared by a Node and the Pod and Service derived from it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    pub namespace: String,
    pub name: String,
}

impl NodeKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing object, by its metadata.
    pub fn of<K: ResourceExt>(obj: &K) -> Self {
        Self::new(obj.namespace().unwrap_or_default(), obj.name_any())
    }

    /// Key of another object in the same namespace.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), name)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_node(&self, key: &NodeKey) -> Result<Node, StoreError>;
    async fn get_pod(&self, key: &NodeKey) -> Result<Pod, StoreError>;
    async fn create_pod(&self, pod: &Pod) -> Result<Pod, StoreError>;
    async fn get_service(&self, key: &NodeKey) -> Result<Service, StoreError>;
    async fn create_service(&self, service: &Service) -> Result<Service, StoreError>;
}

/// [`ObjectStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, kind: &'static str, key: &NodeKey) -> Result<K, StoreError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
        K: Clone + DeserializeOwned + Debug,
    {
        self.api::<K>(&key.namespace)
            .get(&key.name)
            .await
            .map_err(|e| classify(kind, key, e))
    }

    async fn create<K>(&self, kind: &'static str, obj: &K) -> Result<K, StoreError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
        K: Clone + DeserializeOwned + Serialize + Debug,
    {
        let key = NodeKey::of(obj);
        self.api::<K>(&key.namespace)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| classify(kind, &key, e))
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_node(&self, key: &NodeKey) -> Result<Node, StoreError> {
        self.get("Node", key).await
    }

    async fn get_pod(&self, key: &NodeKey) -> Result<Pod, StoreError> {
        self.get("Pod", key).await
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, StoreError> {
        self.create("Pod", pod).await
    }

    async fn get_service(&self, key: &NodeKey) -> Result<Service, StoreError> {
        self.get("Service", key).await
    }

    async fn create_service(&self, service: &Service) -> Result<Service, StoreError> {
        self.create("Service", service).await
    }
}

fn classify(kind: &'static str, key: &NodeKey, err: kube::Error) -> StoreError {
    match &err {
        kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound {
            kind,
            namespace: key.namespace.clone(),
            name: key.name.clone(),
        },
        kube::Error::Api(resp) if resp.code == 409 => StoreError::AlreadyExists {
            kind,
            namespace: key.namespace.clone(),
            name: key.name.clone(),
        },
        _ => StoreError::Api(err),
    }
}
