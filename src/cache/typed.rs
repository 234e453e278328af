//! Typed region wrapper.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Region;
use crate::error::{RegionError, Result};

/// A typed view over a [`Region`], encoding keys and values as JSON.
///
/// This view is:
/// - Thread-safe (the region handle is shared)
/// - Clone-friendly (cloning is cheap, shares the same underlying region)
pub struct TypedRegion<K, V> {
    region: Region,
    _types: PhantomData<fn() -> (K, V)>,
}

// Manual Clone implementation that doesn't require K: Clone, V: Clone
impl<K, V> Clone for TypedRegion<K, V> {
    fn clone(&self) -> Self {
        Self {
            region: self.region.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V> TypedRegion<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    pub fn new(region: Region) -> Self {
        Self {
            region,
            _types: PhantomData,
        }
    }

    /// Get the name of this region.
    pub fn name(&self) -> &str {
        self.region.name()
    }

    /// Get the untyped handle.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Insert a key-value pair into the region.
    pub fn insert(&self, key: &K, value: &V) -> Result<()> {
        let key = self.encode(key)?;
        let value = self.encode(value)?;
        self.region.put(&key, value)
    }

    /// Get a value from the region.
    ///
    /// Returns `Some(value)` if the key exists and hasn't expired.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let key = self.encode(key)?;
        match self.region.get(&key)? {
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|source| self.codec_error(source)),
            None => Ok(None),
        }
    }

    /// Check if a key exists in the region. Resets its idle clock.
    pub fn contains(&self, key: &K) -> Result<bool> {
        let key = self.encode(key)?;
        self.region.touch(&key)
    }

    /// Remove a key from the region.
    pub fn invalidate(&self, key: &K) -> Result<()> {
        let key = self.encode(key)?;
        self.region.remove(&key).map(|_| ())
    }

    /// Remove all entries from the region.
    pub fn invalidate_all(&self) -> Result<()> {
        self.region.clear()
    }

    pub fn entry_count(&self) -> Result<u64> {
        self.region.entry_count()
    }

    /// Get or insert a value using a closure.
    ///
    /// Not atomic across clients: two concurrent misses may both compute and the
    /// last write wins.
    pub fn get_or_insert_with<F>(&self, key: &K, f: F) -> Result<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        let value = f();
        self.insert(key, &value)?;
        Ok(value)
    }

    /// Get or try to insert a value using a fallible closure.
    ///
    /// Returns `Err(e)` if the closure fails; nothing is stored in that case.
    pub fn get_or_try_insert_with<F, E>(&self, key: &K, f: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: From<RegionError>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        let value = f()?;
        self.insert(key, &value)?;
        Ok(value)
    }

    fn encode<T: Serialize + ?Sized>(&self, item: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(item).map_err(|source| self.codec_error(source))
    }

    fn codec_error(&self, source: serde_json::Error) -> RegionError {
        RegionError::Codec {
            name: self.name().to_string(),
            source,
        }
    }
}

impl<K, V> std::fmt::Debug for TypedRegion<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedRegion")
            .field("name", &self.region.name())
            .finish()
    }
}
