//! Region client - owns the cluster connection and hands out region handles.

mod shared;

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Span, debug, error, info, info_span, warn};

pub use shared::{SharedRegionClient, global, install};

use crate::cache::{Region, RegionRegistry, RegionTemplate, TypedRegion};
use crate::cluster::{ClusterConnection, ClusterConnector, ConnectionPolicy};
use crate::config::{ClientConfig, WorkerBlockedAction, join_endpoints};
use crate::error::{ClusterError, RegionError, Result};

/// Lifecycle of an opened client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Started,
    Stopped,
}

/// State shared between a client and the region handles it has handed out.
pub(crate) struct ClientCore {
    connection: Arc<dyn ClusterConnection>,
    state: RwLock<ClientState>,
    worker_blocked_action: WorkerBlockedAction,
    span: Span,
}

impl ClientCore {
    pub(crate) fn ensure_started(&self) -> Result<()> {
        match *self.state.read() {
            ClientState::Started => Ok(()),
            ClientState::Stopped => Err(RegionError::Closed),
        }
    }

    fn state(&self) -> ClientState {
        *self.state.read()
    }

    /// Map a cluster failure on `name` to the caller-facing error, applying the
    /// worker-blocked policy on the way.
    pub(crate) fn region_error(&self, name: &str, err: ClusterError) -> RegionError {
        let _entered = self.span.enter();

        match err {
            ClusterError::WorkerBlocked { .. } => match self.worker_blocked_action {
                WorkerBlockedAction::Stop => {
                    error!(region = name, "Stopping region client: {}", err);
                    self.stop();
                    RegionError::ClusterUnavailable(err)
                }
                WorkerBlockedAction::Ignore => {
                    warn!(region = name, "Ignoring blocked cluster worker: {}", err);
                    RegionError::RegionOperation {
                        name: name.to_string(),
                        source: err,
                    }
                }
            },
            ClusterError::Disconnected if self.state() == ClientState::Stopped => {
                RegionError::Closed
            }
            // Reconnect is disabled, so a dropped connection is final.
            ClusterError::Disconnected => RegionError::ClusterUnavailable(err),
            _ => {
                debug!(region = name, "Region operation failed: {}", err);
                RegionError::RegionOperation {
                    name: name.to_string(),
                    source: err,
                }
            }
        }
    }

    /// Move to `Stopped` and disconnect. Returns `false` if already stopped.
    fn stop(&self) -> bool {
        {
            let mut state = self.state.write();
            if *state == ClientState::Stopped {
                return false;
            }
            *state = ClientState::Stopped;
        }
        self.connection.disconnect();
        true
    }
}

/// Client for named cache regions on a cluster.
///
/// Created with [`CacheRegionClient::open`], which joins the cluster before
/// returning. The client is `Send + Sync`; share it behind an `Arc` (or use
/// [`SharedRegionClient`] for a lazily opened instance).
pub struct CacheRegionClient {
    core: Arc<ClientCore>,
    registry: RegionRegistry,
    template: Arc<RegionTemplate>,
    config: ClientConfig,
}

impl CacheRegionClient {
    /// Validate `config`, join the cluster and return a started client.
    ///
    /// Blocks until joined or until `config.join_timeout` has elapsed.
    ///
    /// # Errors
    /// `RegionError::Config` for invalid policy values,
    /// `RegionError::ClusterUnavailable` if no seed answered in time.
    pub fn open<C>(config: ClientConfig, connector: &C) -> Result<Self>
    where
        C: ClusterConnector + ?Sized,
    {
        config.validate()?;

        let span = info_span!("region_client", seeds = %join_endpoints(&config.endpoints));
        let policy = ConnectionPolicy::from_config(&config);

        let connection = span.in_scope(|| {
            info!("Connecting to cache cluster...");
            let started = Instant::now();

            let connection = connector
                .connect(&config.endpoints, &policy)
                .map_err(|e| {
                    error!("Failed to join cache cluster: {}", e);
                    RegionError::ClusterUnavailable(e)
                })?;

            info!("Joined cache cluster in {:?}", started.elapsed());
            info!(
                "Region expiry: {:?} idle, worker-blocked action: {:?}",
                config.cache_expiry, config.failure_policy.action
            );
            Ok::<_, RegionError>(connection)
        })?;

        let template = Arc::new(RegionTemplate::new(config.cache_expiry));

        Ok(Self {
            core: Arc::new(ClientCore {
                connection,
                state: RwLock::new(ClientState::Started),
                worker_blocked_action: config.failure_policy.action,
                span,
            }),
            registry: RegionRegistry::new(),
            template,
            config,
        })
    }

    /// Get the region named `name`, creating it on the cluster if it doesn't exist.
    ///
    /// An existing region is returned as is, entries and expiry state included.
    pub fn get_region(&self, name: &str) -> Result<Region> {
        validate_name(name)?;
        self.core.ensure_started()?;

        if let Some(region) = self.registry.get(name) {
            return Ok(region);
        }

        let inner = {
            let _entered = self.core.span.enter();
            debug!("Opening region: {}", name);
            self.core
                .connection
                .get_or_create_region(name, &self.template)
                .map_err(|e| self.core.region_error(name, e))?
        };

        Ok(self
            .registry
            .insert(Region::new(inner, Arc::clone(&self.core))))
    }

    /// Get a region through a serde-encoded typed view.
    pub fn get_typed_region<K, V>(&self, name: &str) -> Result<TypedRegion<K, V>>
    where
        K: Serialize,
        V: Serialize + DeserializeOwned,
    {
        self.get_region(name).map(TypedRegion::new)
    }

    /// Permanently remove a region and all of its entries cluster-wide.
    ///
    /// Destroying a region that does not exist is a no-op.
    pub fn destroy_region(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.core.ensure_started()?;

        self.registry.remove(name);

        let _entered = self.core.span.enter();
        let existed = self
            .core
            .connection
            .destroy_region(name)
            .map_err(|e| self.core.region_error(name, e))?;

        if existed {
            info!("Destroyed region: {}", name);
        } else {
            debug!("Region {} does not exist, nothing to destroy", name);
        }
        Ok(())
    }

    /// Disconnect from the cluster. Further operations fail with `RegionError::Closed`.
    ///
    /// Calling this more than once is harmless.
    pub fn close(&self) {
        let stopped_now = self.core.stop();
        // The client may already have stopped itself after a fatal cluster failure.
        self.registry.clear();

        let _entered = self.core.span.enter();
        if stopped_now {
            info!("Region client closed");
        } else {
            debug!("Region client already stopped");
        }
    }

    pub fn state(&self) -> ClientState {
        self.core.state()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Template applied to every region this client creates.
    pub fn template(&self) -> &RegionTemplate {
        &self.template
    }

    /// Names of the regions this client currently holds handles for.
    pub fn region_names(&self) -> Vec<String> {
        self.registry.region_names()
    }
}

impl Drop for CacheRegionClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CacheRegionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegionClient")
            .field("state", &self.state())
            .field("template", &self.template)
            .field("registry", &self.registry)
            .finish()
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RegionError::InvalidArgument("region name must not be empty"));
    }
    Ok(())
}
