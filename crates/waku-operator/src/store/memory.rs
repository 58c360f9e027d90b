//! In-memory object store for tests

use super::{NodeKey, ObjectStore};
use crate::crds::{Node, NodeSpec};
use crate::error::StoreError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service, ServiceSpec};
use kube::{api::ObjectMeta, core::ErrorResponse};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    nodes: BTreeMap<NodeKey, Node>,
    pods: BTreeMap<NodeKey, Pod>,
    services: BTreeMap<NodeKey, Service>,
    pod_creates: usize,
    service_creates: usize,
}

/// Store calls that can be made to fail with a server error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fault {
    GetNode,
    GetPod,
    CreatePod,
    GetService,
    CreateService,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
    /// Reads of Pods and Services report NotFound, as a lagging cache would.
    stale_reads: bool,
    faults: Vec<Fault>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_reads() -> Self {
        Self {
            stale_reads: true,
            ..Default::default()
        }
    }

    pub fn failing(faults: &[Fault]) -> Self {
        Self {
            faults: faults.to_vec(),
            ..Default::default()
        }
    }

    pub fn insert_node(&self, namespace: &str, name: &str, spec: NodeSpec) {
        let mut node = Node::new(name, spec);
        node.metadata.namespace = Some(namespace.to_string());
        node.metadata.uid = Some(format!("uid-{name}"));
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(NodeKey::new(namespace, name), node);
    }

    pub fn insert_service(&self, namespace: &str, name: &str, cluster_ip: Option<&str>) {
        let service = Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                cluster_ip: cluster_ip.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .services
            .insert(NodeKey::new(namespace, name), service);
    }

    pub fn pod(&self, key: &NodeKey) -> Option<Pod> {
        self.state.lock().unwrap().pods.get(key).cloned()
    }

    pub fn service(&self, key: &NodeKey) -> Option<Service> {
        self.state.lock().unwrap().services.get(key).cloned()
    }

    pub fn pod_creates(&self) -> usize {
        self.state.lock().unwrap().pod_creates
    }

    pub fn service_creates(&self) -> usize {
        self.state.lock().unwrap().service_creates
    }

    fn check(&self, call: Fault) -> Result<(), StoreError> {
        if self.faults.contains(&call) {
            return Err(StoreError::Api(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "etcdserver: request timed out".to_string(),
                reason: "InternalError".to_string(),
                code: 500,
            })));
        }
        Ok(())
    }
}

fn not_found(kind: &'static str, key: &NodeKey) -> StoreError {
    StoreError::NotFound {
        kind,
        namespace: key.namespace.clone(),
        name: key.name.clone(),
    }
}

fn already_exists(kind: &'static str, key: &NodeKey) -> StoreError {
    StoreError::AlreadyExists {
        kind,
        namespace: key.namespace.clone(),
        name: key.name.clone(),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_node(&self, key: &NodeKey) -> Result<Node, StoreError> {
        self.check(Fault::GetNode)?;
        let state = self.state.lock().unwrap();
        state
            .nodes
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("Node", key))
    }

    async fn get_pod(&self, key: &NodeKey) -> Result<Pod, StoreError> {
        self.check(Fault::GetPod)?;
        let state = self.state.lock().unwrap();
        match state.pods.get(key) {
            Some(pod) if !self.stale_reads => Ok(pod.clone()),
            _ => Err(not_found("Pod", key)),
        }
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, StoreError> {
        self.check(Fault::CreatePod)?;
        let key = NodeKey::of(pod);
        let mut state = self.state.lock().unwrap();
        if state.pods.contains_key(&key) {
            return Err(already_exists("Pod", &key));
        }
        state.pod_creates += 1;
        state.pods.insert(key, pod.clone());
        Ok(pod.clone())
    }

    async fn get_service(&self, key: &NodeKey) -> Result<Service, StoreError> {
        self.check(Fault::GetService)?;
        let state = self.state.lock().unwrap();
        match state.services.get(key) {
            Some(service) if !self.stale_reads => Ok(service.clone()),
            _ => Err(not_found("Service", key)),
        }
    }

    async fn create_service(&self, service: &Service) -> Result<Service, StoreError> {
        self.check(Fault::CreateService)?;
        let key = NodeKey::of(service);
        let mut state = self.state.lock().unwrap();
        if state.services.contains_key(&key) {
            return Err(already_exists("Service", &key));
        }
        state.service_creates += 1;
        state.services.insert(key, service.clone());
        Ok(service.clone())
    }
}
