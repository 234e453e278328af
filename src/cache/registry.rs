//! Region registry - client-side index of the regions a client has opened.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::Region;

/// Name-keyed map of live region handles.
///
/// Lets repeated `get_region` calls skip the cluster round-trip. Handles whose
/// region was destroyed elsewhere are dropped on lookup.
#[derive(Clone, Default)]
pub struct RegionRegistry {
    regions: Arc<DashMap<String, Region>>,
}

impl RegionRegistry {
    /// Create a new empty region registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a live handle by name.
    ///
    /// Returns `None` if the name is unknown or its region has been destroyed.
    pub fn get(&self, name: &str) -> Option<Region> {
        let region = self.regions.get(name).map(|r| r.value().clone())?;

        if region.is_destroyed() {
            self.regions.remove_if(name, |_, r| r.is_destroyed());
            debug!("Dropped stale handle for region: {}", name);
            return None;
        }
        Some(region)
    }

    /// Record a handle, returning the one the registry keeps.
    ///
    /// If a live handle for the same name was registered concurrently, that one
    /// wins; both refer to the same cluster-side region.
    pub fn insert(&self, region: Region) -> Region {
        match self.regions.entry(region.name().to_string()) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_destroyed() {
                    existing.insert(region.clone());
                    region
                } else {
                    existing.get().clone()
                }
            }
            Entry::Vacant(slot) => {
                debug!("Registered region: {}", region.name());
                slot.insert(region.clone());
                region
            }
        }
    }

    /// Remove a handle from the registry.
    ///
    /// Returns the removed handle, if any.
    pub fn remove(&self, name: &str) -> Option<Region> {
        self.regions.remove(name).map(|(_, region)| region)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Get the number of registered regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Get a list of all registered region names.
    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.regions.clear();
    }
}

impl std::fmt::Debug for RegionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRegistry")
            .field("region_count", &self.len())
            .field("region_names", &self.region_names())
            .finish()
    }
}
