//! Shared test fixtures.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::cluster::MemoryCluster;
use crate::config::ClientConfig;

pub const MEMBER_ADDR: &str = "127.0.0.1:47500";

/// Install a test log subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("region_cache=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A cluster with one running member and a config that reaches it.
pub fn started_cluster() -> (MemoryCluster, ClientConfig) {
    init_tracing();

    let cluster = MemoryCluster::new();
    cluster.start_member(MEMBER_ADDR);

    let config = ClientConfig::with_endpoints("127.0.0.1:47500..47509")
        .expect("valid seed list")
        .join_timeout(Duration::from_millis(500));

    (cluster, config)
}
