//! Kubernetes controllers
//!
//! Reconcilers that watch Node resources and create their Pods and Services.

mod context;
mod node;

pub use context::Context;
pub use node::{reconcile_node, NodeController, Outcome};
