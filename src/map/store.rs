//! Map Store Module
//!
//! Insertion-ordered storage with lazy TTL expiration behind a single lock.
//!
//! Every public method acquires the lock exactly once and then works on the
//! already-locked [`Inner`] form, so one operation composing another (a
//! length check purging expired keys, for example) never re-enters the lock.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

use chrono::Duration;
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::map::entry::{self, Entry, Timestamp};
use crate::map::{Iter, MapStats};

// == Inner State ==
/// Lock-free form of the map. Callers must hold the owning mutex.
pub(crate) struct Inner<K, V> {
    default_ttl: Option<Duration>,
    storage: IndexMap<K, Entry<V>>,
    stats: MapStats,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            default_ttl,
            storage: IndexMap::new(),
            stats: MapStats::new(),
        }
    }

    /// Stores `value` under `key`, keeping the key's original position if
    /// it is already present.
    pub(crate) fn insert(&mut self, key: K, value: V, ttl: Option<Duration>, now: Timestamp) {
        self.storage.insert(key, Entry::new(value, ttl, now));
    }

    pub(crate) fn insert_default(&mut self, key: K, value: V, now: Timestamp) {
        let ttl = self.default_ttl;
        self.insert(key, value, ttl, now);
    }

    /// Returns the entry for `key` if it is live at `now`.
    ///
    /// A logically expired entry is removed on the way out.
    pub(crate) fn live_entry_mut<Q>(&mut self, key: &Q, now: Timestamp) -> Option<&mut Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.storage.get_index_of(key)?;
        if self.storage[index].is_expired_at(now) {
            self.storage.shift_remove_index(index);
            self.stats.record_purged(1);
            trace!(index, "purged expired entry on access");
            return None;
        }
        self.storage.get_index_mut(index).map(|(_, entry)| entry)
    }

    /// Looks up a live value and records the hit or miss.
    pub(crate) fn lookup<Q>(&mut self, key: &Q, now: Timestamp) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.live_entry_mut(key, now).is_none() {
            self.stats.record_miss();
            return None;
        }
        self.stats.record_hit();
        self.storage.get(key).map(|entry| &entry.value)
    }

    /// Removes every entry expired at `now`. Returns the number removed.
    pub(crate) fn purge(&mut self, now: Timestamp) -> usize {
        let before = self.storage.len();
        self.storage.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.storage.len();
        if removed > 0 {
            self.stats.record_purged(removed);
            debug!(removed, remaining = self.storage.len(), "purged expired entries");
        }
        removed
    }

    /// Removes the leading run of expired entries among the first `window`
    /// entries, stopping at the first live one.
    pub(crate) fn purge_front(&mut self, window: usize, now: Timestamp) -> usize {
        let removed = self
            .storage
            .values()
            .take(window)
            .take_while(|entry| entry.is_expired_at(now))
            .count();
        if removed > 0 {
            self.storage.drain(..removed);
            self.stats.record_purged(removed);
            debug!(removed, window, "purged expired entries at front");
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn entry<Q>(&self, key: &Q) -> Option<&Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.get(key)
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.shift_remove(key).map(|entry| entry.value)
    }

    pub(crate) fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub(crate) fn stats(&self) -> MapStats {
        let mut stats = self.stats.clone();
        stats.stored_entries = self.storage.len();
        stats
    }
}

impl<K: Hash + Eq + Clone, V> Inner<K, V> {
    pub(crate) fn key_snapshot(&self) -> Vec<K> {
        self.storage.keys().cloned().collect()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Inner<K, V> {
    pub(crate) fn items(&self) -> Vec<(K, V)> {
        self.storage
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }
}

// == Expiring Ordered Map ==
/// Thread-safe, insertion-ordered map whose entries expire lazily.
///
/// Expired entries are treated as absent immediately but are only removed
/// when an operation observes them. `len`, `keys`, `values` and `items`
/// purge the whole map first; single-key operations purge only the key
/// they touch.
pub struct ExpiringOrderedMap<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Hash + Eq, V> ExpiringOrderedMap<K, V> {
    // == Constructors ==
    /// Creates an empty map. Entries inserted with [`insert`](Self::insert)
    /// expire `default_ttl` after insertion, or never if it is None.
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner::new(default_ttl)),
        }
    }

    /// Creates a map seeded with `entries`, all using `default_ttl`.
    pub fn with_entries<I>(default_ttl: Option<Duration>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let map = Self::new(default_ttl);
        map.update(entries);
        map
    }

    /// Creates an empty map using the configured default TTL.
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.default_ttl())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock()
    }

    /// Default TTL applied by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Option<Duration> {
        self.lock().default_ttl()
    }

    // == Insert ==
    /// Stores `value` under `key` with the default TTL.
    ///
    /// Overwrites any existing entry, including its expiry. An existing key
    /// keeps its position in iteration order.
    pub fn insert(&self, key: K, value: V) {
        self.lock().insert_default(key, value, entry::now());
    }

    /// Stores `value` under `key` with an explicit TTL, None = never expires.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        self.lock().insert(key, value, ttl, entry::now());
    }

    // == Update ==
    /// Inserts every pair from `source` in order, as one atomic operation.
    ///
    /// `source` is drained before the lock is taken, so it may read from
    /// this same map.
    pub fn update<I>(&self, source: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = source.into_iter().collect();
        let now = entry::now();
        let mut inner = self.lock();
        for (key, value) in pairs {
            inner.insert_default(key, value, now);
        }
    }

    // == Contains ==
    /// Returns true if `key` holds a live entry, purging it if expired.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().live_entry_mut(key, entry::now()).is_some()
    }

    // == Delete ==
    /// Removes `key` and returns its value.
    ///
    /// Physical presence governs this operation: an expired entry that has
    /// not been purged yet is still deletable.
    pub fn delete<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.lock()
            .remove(key)
            .ok_or_else(|| MapError::key_not_found(key))
    }

    // == Set TTL ==
    /// Sets the key to expire `ttl` from now, preserving its value.
    pub fn set_ttl<Q>(&self, key: &Q, ttl: Duration) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.set_ttl_at(key, ttl, entry::now())
    }

    /// Sets the key to expire `ttl` after `now`.
    ///
    /// Fails with `KeyNotFound` if the key is absent or expired at `now`.
    pub fn set_ttl_at<Q>(&self, key: &Q, ttl: Duration, now: Timestamp) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let mut inner = self.lock();
        let entry = inner
            .live_entry_mut(key, now)
            .ok_or_else(|| MapError::key_not_found(key))?;
        entry.expires_at = Some(entry::deadline(now, ttl));
        Ok(())
    }

    // == Expire At ==
    /// Sets the absolute expiry deadline of a live key.
    pub fn expire_at<Q>(&self, key: &Q, timestamp: Timestamp) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let mut inner = self.lock();
        let entry = inner
            .live_entry_mut(key, entry::now())
            .ok_or_else(|| MapError::key_not_found(key))?;
        entry.expires_at = Some(timestamp);
        Ok(())
    }

    // == Get TTL ==
    /// Returns the remaining TTL of `key`, None if it never expires.
    pub fn get_ttl<Q>(&self, key: &Q) -> Result<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.get_ttl_at(key, entry::now())
    }

    /// Returns `expiry - now` for a stored key. The result is negative if
    /// the entry has expired but not been purged; nothing is removed.
    pub fn get_ttl_at<Q>(&self, key: &Q, now: Timestamp) -> Result<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.lock()
            .entry(key)
            .map(|entry| entry.ttl_at(now))
            .ok_or_else(|| MapError::key_not_found(key))
    }

    // == Is Expired ==
    /// Checks whether a stored key is logically expired now.
    pub fn is_expired<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.is_expired_at(key, entry::now())
    }

    /// Checks whether a stored key is logically expired at `now`.
    ///
    /// Does not mutate the map. A key that is not stored, because it was
    /// never inserted or has already been purged, fails with `KeyNotFound`.
    pub fn is_expired_at<Q>(&self, key: &Q, now: Timestamp) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.lock()
            .entry(key)
            .map(|entry| entry.is_expired_at(now))
            .ok_or_else(|| MapError::key_not_found(key))
    }

    // == Length ==
    /// Purges every expired entry, then returns the number of live entries.
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        inner.purge(entry::now());
        inner.len()
    }

    /// Purges every expired entry, then reports whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Purge ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.lock().purge(entry::now())
    }

    // == Stats ==
    /// Returns current map statistics.
    pub fn stats(&self) -> MapStats {
        self.lock().stats()
    }
}

impl<K: Hash + Eq, V: Clone> ExpiringOrderedMap<K, V> {
    // == Get ==
    /// Returns a copy of the value for `key`.
    ///
    /// An expired entry is removed and reported as `KeyNotFound`.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        match self.lock().lookup(key, entry::now()) {
            Some(value) => Ok(value.clone()),
            None => {
                trace!(key = ?key, "lookup missed");
                Err(MapError::key_not_found(key))
            }
        }
    }

    /// Returns the value for `key`, or `default` if it is absent or expired.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock()
            .lookup(key, entry::now())
            .cloned()
            .unwrap_or(default)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> ExpiringOrderedMap<K, V> {
    // == Iteration ==
    /// Lazily walks the live entries in insertion order.
    ///
    /// The key set is captured when this is called: keys inserted later are
    /// not yielded, and keys deleted or expired before they are reached are
    /// skipped. The lock is only held while each step runs, so the loop
    /// body may call back into the map.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let keys = self.lock().key_snapshot();
        Iter::new(self, keys)
    }

    /// Purges, then returns the live keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        let mut inner = self.lock();
        inner.purge(entry::now());
        inner.key_snapshot()
    }

    /// Purges, then returns the live values in insertion order.
    pub fn values(&self) -> Vec<V> {
        self.items().into_iter().map(|(_, value)| value).collect()
    }

    /// Purges, then returns the live key/value pairs in insertion order.
    pub fn items(&self) -> Vec<(K, V)> {
        let mut inner = self.lock();
        inner.purge(entry::now());
        inner.items()
    }
}

impl<K: Hash + Eq, V> Default for ExpiringOrderedMap<K, V> {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Purges, then renders the default TTL and the live entries in order.
impl<K: Hash + Eq + Debug, V: Debug> Debug for ExpiringOrderedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut inner = self.lock();
        inner.purge(entry::now());
        let entries: Vec<(&K, &V)> = inner
            .storage
            .iter()
            .map(|(key, entry)| (key, &entry.value))
            .collect();
        f.debug_struct("ExpiringOrderedMap")
            .field("default_ttl", &inner.default_ttl)
            .field("entries", &entries)
            .finish()
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for ExpiringOrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

impl<'a, K: Hash + Eq + Clone, V: Clone> IntoIterator for &'a ExpiringOrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
