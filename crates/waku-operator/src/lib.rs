//! Waku Operator Library
//!
//! Kubernetes operator running Waku nodes. A `Node` resource describes one
//! node; the operator creates a Pod that runs it with the matching command
//! line and a Service exposing its RPC and libp2p ports.
//!
//! The operator only creates what is missing. Changing a Node after its Pod
//! exists has no effect until the Pod is deleted.

pub mod config;
pub mod controllers;
pub mod crds;
pub mod error;
pub mod resolver;
pub mod store;
pub mod workload;

pub use crds::{Node, NodeSpec};
