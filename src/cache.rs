// src/cache.rs

//! Lookup memoization
//!
//! Tokenized recipes, hosted repository metadata and package index
//! downloads are pure for the lifetime of one process, so their results are
//! cached by exact input value. Entries never expire and nothing is
//! persisted between runs.
//!
//! Consumers take the cache through the [`LookupCache`] trait so tests can
//! swap in [`NoCache`] or their own fake.

use std::collections::HashMap;
use std::sync::RwLock;

/// Get/put interface over a string-keyed cache
pub trait LookupCache<V: Clone>: Send + Sync {
    /// Get a cached value
    fn get(&self, key: &str) -> Option<V>;

    /// Store a value
    fn put(&self, key: String, value: V);

    /// Get a cached value or compute and store it
    ///
    /// Errors from `compute` are returned and never cached.
    fn get_or_try_insert<E, F>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
        Self: Sized,
    {
        if let Some(cached) = self.get(key) {
            return Ok(cached);
        }

        let value = compute()?;
        self.put(key.to_string(), value.clone());
        Ok(value)
    }
}

/// In-memory cache with process lifetime
pub struct MemoCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoCache<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl<V: Clone + Send + Sync> LookupCache<V> for MemoCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: String, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, value);
        }
    }
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl<V: Clone> LookupCache<V> for NoCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn put(&self, _key: String, _value: V) {}
}
