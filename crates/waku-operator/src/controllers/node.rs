//! Node controller
//!
//! Each pass makes sure the Node's Pod and Service exist. A pass creates at
//! most one object and then requeues, so the next pass sees the new object
//! before moving on. Existing objects are never updated: a Pod built from an
//! older spec keeps running until it is deleted.

use super::Context;
use crate::config::OperatorConfig;
use crate::crds::Node;
use crate::error::{ReconcileError, StoreError};
use crate::store::NodeKey;
use crate::workload;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{
    api::Api,
    runtime::{
        controller::{Action, Controller},
        watcher::Config,
    },
    Client, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Result of a successful pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing left to do until the Node or one of its objects changes.
    Done,
    /// An object was created; run another pass.
    Requeue,
}

impl Outcome {
    pub fn into_action(self, config: &OperatorConfig) -> Action {
        match self {
            Outcome::Done => Action::await_change(),
            Outcome::Requeue => Action::requeue(config.requeue_interval),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Presence {
    Found,
    Created,
}

pub struct NodeController;

impl NodeController {
    pub async fn run(client: Client, ctx: Arc<Context>) {
        let nodes: Api<Node> = Api::all(client.clone());
        let pods: Api<Pod> = Api::all(client.clone());
        let services: Api<Service> = Api::all(client);
        let owned = Config::default().labels(&format!("app={}", workload::APP_LABEL));

        Controller::new(nodes, Config::default())
            .owns(pods, owned.clone())
            .owns(services, owned)
            .shutdown_on_signal()
            .run(reconcile, error_policy, ctx)
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => info!(name = %obj.name, "Reconciled Node"),
                    Err(e) => error!(error = %e, "Reconcile error"),
                }
            })
            .await;
    }
}

async fn reconcile(node: Arc<Node>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let key = NodeKey::of(node.as_ref());
    let outcome = reconcile_node(&key, &ctx).await?;
    Ok(outcome.into_action(&ctx.config))
}

fn error_policy(node: Arc<Node>, error: &ReconcileError, ctx: Arc<Context>) -> Action {
    error!(name = %node.name_any(), error = %error, "Reconcile failed");
    Action::requeue(ctx.config.error_requeue_interval)
}

/// One reconciliation pass for the Node identified by `key`.
#[instrument(skip_all, fields(node = %key))]
pub async fn reconcile_node(key: &NodeKey, ctx: &Context) -> Result<Outcome, ReconcileError> {
    let node = match ctx.store.get_node(key).await {
        Ok(node) => node,
        Err(e) if e.is_not_found() => {
            info!("Node not found, probably deleted");
            return Ok(Outcome::Done);
        }
        Err(e) => {
            error!(error = %e, "Failed to get Node");
            return Err(e.into());
        }
    };

    if ensure_pod(&node, key, ctx).await? == Presence::Created {
        return Ok(Outcome::Requeue);
    }
    if ensure_service(&node, key, ctx).await? == Presence::Created {
        return Ok(Outcome::Requeue);
    }

    debug!("Pod and Service present");
    Ok(Outcome::Done)
}

async fn ensure_pod(node: &Node, key: &NodeKey, ctx: &Context) -> Result<Presence, ReconcileError> {
    match ctx.store.get_pod(key).await {
        Ok(_) => return Ok(Presence::Found),
        Err(e) if e.is_not_found() => {}
        Err(e) => {
            error!(error = %e, "Failed to get Pod");
            return Err(e.into());
        }
    }

    let pod = workload::pod_from_node(node, ctx.resolver.as_ref())
        .await
        .inspect_err(|e| error!(error = %e, "Failed to build Pod"))?;

    info!("Creating Pod");
    created(ctx.store.create_pod(&pod).await).map_err(|e| {
        error!(error = %e, "Failed to create Pod");
        e.into()
    })
}

async fn ensure_service(
    node: &Node,
    key: &NodeKey,
    ctx: &Context,
) -> Result<Presence, ReconcileError> {
    match ctx.store.get_service(key).await {
        Ok(_) => return Ok(Presence::Found),
        Err(e) if e.is_not_found() => {}
        Err(e) => {
            error!(error = %e, "Failed to get Service");
            return Err(e.into());
        }
    }

    info!("Creating Service");
    created(ctx.store.create_service(&workload::service_from_node(node)).await).map_err(|e| {
        error!(error = %e, "Failed to create Service");
        e.into()
    })
}

/// A create that lost a race against another pass counts as found.
fn created<T>(result: Result<T, StoreError>) -> Result<Presence, StoreError> {
    match result {
        Ok(_) => Ok(Presence::Created),
        Err(e) if e.is_already_exists() => {
            debug!(error = %e, "Object created concurrently");
            Ok(Presence::Found)
        }
        Err(e) => Err(e),
    }
}
