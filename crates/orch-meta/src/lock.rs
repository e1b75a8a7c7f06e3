//! Per-resource lock registry
//!
//! Lazily populated map from resource key to a mutual-exclusion handle.
//! Entries are created atomically on first access and live as long as the
//! registry. Fetching a lock only touches one DashMap shard briefly; callers
//! block only while holding the returned mutex.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// Shared handle to one resource's lock
pub type ResourceLock = Arc<Mutex<()>>;

/// Concurrent registry of resource locks
///
/// The same key always yields the same [`ResourceLock`] instance; two distinct
/// keys never share one.
#[derive(Debug)]
pub struct LockRegistry<K = String>
where
    K: Eq + Hash,
{
    locks: DashMap<K, ResourceLock>,
}

impl<K> LockRegistry<K>
where
    K: Eq + Hash + Clone,
{
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get the lock for `key`, creating it on first access
    ///
    /// The shard guard taken by `entry` makes create-if-absent atomic, so two
    /// racing callers always receive the same instance.
    #[must_use]
    pub fn acquire(&self, key: &K) -> ResourceLock {
        if let Some(existing) = self.locks.get(key) {
            return Arc::clone(existing.value());
        }

        Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Number of keys touched so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if no lock has been created yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Check if a lock exists for `key`
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.locks.contains_key(key)
    }
}

impl<K> Default for LockRegistry<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
