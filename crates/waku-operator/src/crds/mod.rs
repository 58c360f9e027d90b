//! Custom Resource Definitions

pub mod node;

pub use node::{Discv5Config, Node, NodeSpec, Protocol};
