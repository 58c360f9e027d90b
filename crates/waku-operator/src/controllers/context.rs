//! Shared controller context

use crate::config::OperatorConfig;
use crate::resolver::ResolvePeer;
use crate::store::ObjectStore;
use std::sync::Arc;

/// Shared context for reconciliation passes.
pub struct Context {
    pub store: Arc<dyn ObjectStore>,
    pub resolver: Arc<dyn ResolvePeer>,
    pub config: OperatorConfig,
}

impl Context {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        resolver: Arc<dyn ResolvePeer>,
        config: OperatorConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }
}
