//! Lazily opened, shared region client.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use super::{CacheRegionClient, ClientState, validate_name};
use crate::cache::Region;
use crate::cluster::ClusterConnector;
use crate::config::ClientConfig;
use crate::error::Result;

static GLOBAL: OnceCell<SharedRegionClient> = OnceCell::new();

/// A region client opened on first use.
///
/// Concurrent first callers block until the single `open` completes, so exactly
/// one cluster connection is established. If `open` fails, that caller gets the
/// error and the next call tries again.
pub struct SharedRegionClient {
    config: ClientConfig,
    connector: Arc<dyn ClusterConnector>,
    client: OnceCell<Arc<CacheRegionClient>>,
}

impl SharedRegionClient {
    pub fn new(config: ClientConfig, connector: Arc<dyn ClusterConnector>) -> Self {
        Self {
            config,
            connector,
            client: OnceCell::new(),
        }
    }

    /// Get the client, opening it if this is the first use.
    pub fn client(&self) -> Result<Arc<CacheRegionClient>> {
        self.client
            .get_or_try_init(|| {
                CacheRegionClient::open(self.config.clone(), self.connector.as_ref()).map(Arc::new)
            })
            .cloned()
    }

    pub fn get_region(&self, name: &str) -> Result<Region> {
        validate_name(name)?;
        self.client()?.get_region(name)
    }

    pub fn destroy_region(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.client()?.destroy_region(name)
    }

    /// Whether the client has been opened and not yet shut down.
    pub fn is_started(&self) -> bool {
        self.client
            .get()
            .is_some_and(|client| client.state() == ClientState::Started)
    }

    /// Close the client if it was opened. Later calls fail with `RegionError::Closed`.
    pub fn shutdown(&self) {
        if let Some(client) = self.client.get() {
            info!("Shutting down shared region client");
            client.close();
        }
    }
}

impl std::fmt::Debug for SharedRegionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegionClient")
            .field("config", &self.config)
            .field("client", &self.client.get())
            .finish()
    }
}

/// Install the process-wide shared client.
///
/// Only the first install succeeds; a rejected client is handed back.
pub fn install(shared: SharedRegionClient) -> std::result::Result<&'static SharedRegionClient, SharedRegionClient> {
    GLOBAL.try_insert(shared).map_err(|(_, rejected)| rejected)
}

/// The process-wide shared client, if one was installed.
pub fn global() -> Option<&'static SharedRegionClient> {
    GLOBAL.get()
}
