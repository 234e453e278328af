//! Region handle.

use std::sync::Arc;

use crate::client::ClientCore;
use crate::cluster::{ClusterRegion, Value};
use crate::error::Result;

/// Handle to a named cluster-side region.
///
/// Handles are cheap to clone; every clone addresses the same region. Each
/// successful read, write or touch resets the entry's idle expiry.
#[derive(Clone)]
pub struct Region {
    inner: Arc<dyn ClusterRegion>,
    core: Arc<ClientCore>,
}

impl Region {
    pub(crate) fn new(inner: Arc<dyn ClusterRegion>, core: Arc<ClientCore>) -> Self {
        Self { inner, core }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Get a value. Returns `None` if the key is absent or has expired.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        self.core.ensure_started()?;
        self.inner.get(key).map_err(|e| self.core.region_error(self.name(), e))
    }

    pub fn put(&self, key: &[u8], value: impl Into<Value>) -> Result<()> {
        self.core.ensure_started()?;
        self.inner
            .put(key, value.into())
            .map_err(|e| self.core.region_error(self.name(), e))
    }

    /// Reset the idle clock of `key`. Returns `false` if it is absent.
    pub fn touch(&self, key: &[u8]) -> Result<bool> {
        self.core.ensure_started()?;
        self.inner
            .touch(key)
            .map_err(|e| self.core.region_error(self.name(), e))
    }

    /// Check if a key is present. Counts as an access.
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        self.touch(key)
    }

    pub fn remove(&self, key: &[u8]) -> Result<Option<Value>> {
        self.core.ensure_started()?;
        self.inner
            .remove(key)
            .map_err(|e| self.core.region_error(self.name(), e))
    }

    /// Remove all entries, keeping the region itself.
    pub fn clear(&self) -> Result<()> {
        self.core.ensure_started()?;
        self.inner
            .clear()
            .map_err(|e| self.core.region_error(self.name(), e))
    }

    /// Get the number of entries in the region.
    ///
    /// Note: This may not be perfectly accurate due to concurrent operations.
    pub fn entry_count(&self) -> Result<u64> {
        self.core.ensure_started()?;
        self.inner
            .entry_count()
            .map_err(|e| self.core.region_error(self.name(), e))
    }

    /// Whether the region has been destroyed since this handle was obtained.
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
