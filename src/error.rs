//! Error types for the region client and its cluster collaborator.

use std::time::Duration;

/// Errors reported by a cluster backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// No seed address answered before the join timeout elapsed.
    #[error("failed to join cluster via [{seeds}] within {timeout:?}")]
    JoinTimeout { seeds: String, timeout: Duration },

    /// The region was destroyed while a handle to it was still in use.
    #[error("region '{name}' has been destroyed")]
    RegionDestroyed { name: String },

    /// The connection was shut down.
    #[error("cluster connection is disconnected")]
    Disconnected,

    /// A cluster worker exceeded the blocked-worker timeout.
    #[error("cluster worker blocked for longer than {timeout:?}")]
    WorkerBlocked { timeout: Duration },

    /// Network or peer failure while talking to the cluster.
    #[error("transient cluster error: {message}")]
    Transient { message: String },
}

/// Invalid client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid cluster endpoint '{addr}': {reason}")]
    InvalidEndpoint { addr: String, reason: String },

    #[error("no cluster endpoints configured")]
    NoEndpoints,

    #[error("{key} must be positive")]
    NotPositive { key: &'static str },

    #[error("{key} must not exceed {max:?}")]
    TooLarge { key: &'static str, max: Duration },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors surfaced to callers of [`CacheRegionClient`](crate::CacheRegionClient).
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// The cluster could not be joined, or the client stopped itself after a fatal
    /// cluster failure.
    #[error("cluster unavailable: {0}")]
    ClusterUnavailable(#[source] ClusterError),

    /// Caller passed an unusable argument; no network call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A get/create/destroy or entry operation failed on the cluster side.
    #[error("region '{name}' operation failed")]
    RegionOperation {
        name: String,
        #[source]
        source: ClusterError,
    },

    /// Value (de)serialization failed in a typed region.
    #[error("region '{name}' codec error")]
    Codec {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client has been closed.
    #[error("region client is closed")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = RegionError> = std::result::Result<T, E>;
