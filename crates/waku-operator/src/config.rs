//! Operator configuration
//!
//! Defaults match what a Waku node exposes out of the box; every value can be
//! overridden from the command line or the environment (see `main.rs`).

use std::time::Duration;

/// Well-known port of a node's JSON-RPC endpoint, as exposed by its Service.
pub const DEFAULT_RPC_PORT: u16 = 8545;

/// Settings for resolving static peers through a sibling's info endpoint.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Port the sibling Service exposes its RPC endpoint on
    pub rpc_port: u16,
    /// Upper bound for the whole info request, connect included
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            rpc_port: DEFAULT_RPC_PORT,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub resolver: ResolverConfig,
    /// Delay before the follow-up pass after creating a Pod or Service
    pub requeue_interval: Duration,
    /// Delay before retrying a failed pass
    pub error_requeue_interval: Duration,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            requeue_interval: Duration::from_secs(5),
            error_requeue_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_config_default() {
        let config = OperatorConfig::default();
        assert_eq!(config.resolver.rpc_port, 8545);
        assert_eq!(config.resolver.timeout, Duration::from_secs(10));
        assert_eq!(config.error_requeue_interval, Duration::from_secs(60));
    }
}
