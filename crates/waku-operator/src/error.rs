//! Operator error types

use thiserror::Error;

/// Outcome of a failed object store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("Kubernetes error: {0}")]
    Api(#[source] kube::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// A static peer reference could not be turned into a multiaddr.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("peer reference {reference:?} is not a valid multiaddr: {source}")]
    InvalidMultiaddr {
        reference: String,
        #[source]
        source: libp2p::multiaddr::Error,
    },
    #[error("peer reference {reference:?}: service lookup failed: {source}")]
    ServiceLookup {
        reference: String,
        #[source]
        source: StoreError,
    },
    #[error("peer reference {reference:?}: service has no cluster IP")]
    MissingClusterIp { reference: String },
    #[error("peer reference {reference:?}: info request to {url} failed: {source}")]
    Request {
        reference: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("peer reference {reference:?}: info request to {url} returned {status}")]
    Status {
        reference: String,
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("peer reference {reference:?}: malformed info reply from {url}: {source}")]
    Decode {
        reference: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("peer reference {reference:?}: {url} reported no listen addresses")]
    NoListenAddresses { reference: String, url: String },
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("failed to resolve static peer: {0}")]
    Resolution(#[from] ResolutionError),
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),
    #[error("cannot build workload: {0}")]
    Translation(#[from] TranslationError),
}
