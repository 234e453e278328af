//! Region Cache - client-side region registry for a clustered in-memory cache.
//!
//! A [`CacheRegionClient`] joins a cluster once, then hands out named regions
//! created on first access. Every region shares one template: touch-based idle
//! expiry, no backups, no copy on read.
//!
//! ## Architecture
//!
//! - `config` - Policy values, seed parsing, environment loading
//! - `cluster` - Collaborator traits and the in-process `MemoryCluster` backend
//! - `cache` - Region handles, typed views and the client-side registry
//! - `client` - Client lifecycle and the lazily opened shared client
//! - `error` - Error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use region_cache::{CacheRegionClient, ClientConfig, MemoryCluster};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = MemoryCluster::new();
//! cluster.start_member("127.0.0.1:47500");
//!
//! let client = CacheRegionClient::open(ClientConfig::from_env()?, &cluster)?;
//! let sessions = client.get_region("sessions")?;
//! sessions.put(b"user:42", b"token".to_vec())?;
//!
//! client.destroy_region("sessions")?;
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod cluster;
pub mod config;
pub mod error;

#[cfg(test)]
mod testing;

pub use cache::{Region, RegionTemplate, TypedRegion};
pub use client::{CacheRegionClient, ClientState, SharedRegionClient};
pub use cluster::{ClusterConnection, ClusterConnector, ClusterRegion, MemoryCluster};
pub use config::{ClientConfig, ClusterEndpoint, FailurePolicy, WorkerBlockedAction};
pub use error::{ClusterError, ConfigError, RegionError, Result};
