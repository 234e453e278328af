//! Cluster collaborator interface.
//!
//! The region client never talks to the network directly. A backend implements
//! [`ClusterConnector`] to join a cluster and hands back a [`ClusterConnection`]
//! that creates, fetches and destroys regions.
//!
//! [`MemoryCluster`] is the in-process backend.

mod memory;

use std::sync::Arc;
use std::time::Duration;

pub use memory::{Fault, MemoryCluster};

use crate::cache::RegionTemplate;
use crate::config::{ClientConfig, ClusterEndpoint, FailurePolicy};
use crate::error::ClusterError;

/// Stored entry value. Shared, so a read without copy-on-read is a refcount bump.
pub type Value = Arc<[u8]>;

/// Connection-level policy, applied once when joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// Join as a client: this process holds no cluster-side storage.
    pub client_mode: bool,

    /// Never silently rejoin after the connection drops.
    pub reconnect_disabled: bool,

    /// Outbound messages buffered per peer before it counts as unresponsive.
    /// Transport-level; `MemoryCluster` only records it.
    pub slow_client_queue_limit: u32,

    /// Transport-level; `MemoryCluster` only records it.
    pub idle_connection_timeout: Duration,

    pub join_timeout: Duration,
    pub failure: FailurePolicy,
}

impl ConnectionPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client_mode: true,
            reconnect_disabled: true,
            slow_client_queue_limit: config.slow_client_queue_limit,
            idle_connection_timeout: config.idle_connection_timeout,
            join_timeout: config.join_timeout,
            failure: config.failure_policy,
        }
    }
}

/// Joins a cluster.
pub trait ClusterConnector: Send + Sync {
    /// Block until a member reachable through `seeds` accepts us, or fail with
    /// [`ClusterError::JoinTimeout`] once `policy.join_timeout` has elapsed.
    fn connect(
        &self,
        seeds: &[ClusterEndpoint],
        policy: &ConnectionPolicy,
    ) -> Result<Arc<dyn ClusterConnection>, ClusterError>;
}

/// An established cluster connection.
pub trait ClusterConnection: Send + Sync {
    /// Fetch the region named `name`, creating it from `template` if absent.
    /// An existing region keeps its entries and its original template.
    fn get_or_create_region(
        &self,
        name: &str,
        template: &RegionTemplate,
    ) -> Result<Arc<dyn ClusterRegion>, ClusterError>;

    /// Remove a region and all its entries. Returns `false` if it did not exist.
    fn destroy_region(&self, name: &str) -> Result<bool, ClusterError>;

    fn disconnect(&self);
}

/// One cluster-side region.
///
/// Every successful `get`, `put` or `touch` resets the entry's idle clock.
pub trait ClusterRegion: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &[u8]) -> Result<Option<Value>, ClusterError>;

    fn put(&self, key: &[u8], value: Value) -> Result<(), ClusterError>;

    /// Reset the idle clock without reading. Returns `false` if the key is absent.
    fn touch(&self, key: &[u8]) -> Result<bool, ClusterError>;

    fn remove(&self, key: &[u8]) -> Result<Option<Value>, ClusterError>;

    fn clear(&self) -> Result<(), ClusterError>;

    /// Approximate number of live entries.
    fn entry_count(&self) -> Result<u64, ClusterError>;

    fn is_destroyed(&self) -> bool;
}
