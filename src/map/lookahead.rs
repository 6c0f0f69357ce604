//! Bounded Look-Ahead Map Module
//!
//! An [`ExpiringOrderedMap`] that opportunistically purges the oldest few
//! entries on every insert and lookup.
//!
//! With a single default TTL, insertion order tracks expiry order, so
//! expired entries cluster at the front. Each write or read inspects at
//! most `lookahead` front entries and stops at the first live one. Entries
//! deeper in the map stay stored until a full purge (`len`, `keys`, ...).
//! Changing TTLs at runtime would break that ordering, so `set_ttl` and
//! `expire_at` are rejected.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

use chrono::Duration;
use tracing::warn;

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::map::entry::{self, Timestamp};
use crate::map::{ExpiringOrderedMap, Iter, MapStats, LOOKAHEAD_WINDOW};

// == Bounded Look-Ahead Map ==
/// Expiring ordered map with a bounded front purge on insert and lookup.
pub struct BoundedLookAheadMap<K, V> {
    map: ExpiringOrderedMap<K, V>,
    lookahead: usize,
}

impl<K: Hash + Eq, V> BoundedLookAheadMap<K, V> {
    // == Constructors ==
    /// Creates an empty map inspecting [`LOOKAHEAD_WINDOW`] entries per call.
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self::with_lookahead(default_ttl, LOOKAHEAD_WINDOW)
    }

    /// Creates an empty map inspecting `lookahead` entries per call.
    pub fn with_lookahead(default_ttl: Option<Duration>, lookahead: usize) -> Self {
        Self {
            map: ExpiringOrderedMap::new(default_ttl),
            lookahead,
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

    /// Creates an empty map from the configured TTL and window size.
    pub fn from_config(config: &MapConfig) -> Self {
        Self::with_lookahead(config.default_ttl(), config.lookahead)
    }

    /// Number of front entries inspected per insert or lookup.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Default TTL applied by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Option<Duration> {
        self.map.default_ttl()
    }

    // == Insert ==
    /// Purges expired entries at the front, then stores `value` under `key`.
    pub fn insert(&self, key: K, value: V) {
        let now = entry::now();
        let mut inner = self.map.lock();
        inner.purge_front(self.lookahead, now);
        inner.insert_default(key, value, now);
    }

    /// Inserts every pair from `source` in order, purging the front before
    /// each one, as one atomic operation. `source` is drained before the
    /// lock is taken.
    pub fn update<I>(&self, source: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = source.into_iter().collect();
        let now = entry::now();
        let mut inner = self.map.lock();
        for (key, value) in pairs {
            inner.purge_front(self.lookahead, now);
            inner.insert_default(key, value, now);
        }
    }

    // == Unsupported ==
    /// Always fails: runtime TTL changes break the front-loaded expiry order.
    pub fn set_ttl<Q>(&self, _key: &Q, _ttl: Duration) -> Result<()>
    where
        Q: ?Sized,
    {
        Err(unsupported("set_ttl"))
    }

    /// Always fails, see [`set_ttl`](Self::set_ttl).
    pub fn set_ttl_at<Q>(&self, _key: &Q, _ttl: Duration, _now: Timestamp) -> Result<()>
    where
        Q: ?Sized,
    {
        Err(unsupported("set_ttl_at"))
    }

    /// Always fails, see [`set_ttl`](Self::set_ttl).
    pub fn expire_at<Q>(&self, _key: &Q, _timestamp: Timestamp) -> Result<()>
    where
        Q: ?Sized,
    {
        Err(unsupported("expire_at"))
    }

    // == Delegated ==
    /// See [`ExpiringOrderedMap::contains_key`].
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// See [`ExpiringOrderedMap::delete`].
    pub fn delete<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.map.delete(key)
    }

    /// See [`ExpiringOrderedMap::get_ttl`].
    pub fn get_ttl<Q>(&self, key: &Q) -> Result<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.map.get_ttl(key)
    }

    /// See [`ExpiringOrderedMap::get_ttl_at`].
    pub fn get_ttl_at<Q>(&self, key: &Q, now: Timestamp) -> Result<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.map.get_ttl_at(key, now)
    }

    /// See [`ExpiringOrderedMap::is_expired`].
    pub fn is_expired<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.map.is_expired(key)
    }

    /// See [`ExpiringOrderedMap::is_expired_at`].
    pub fn is_expired_at<Q>(&self, key: &Q, now: Timestamp) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.map.is_expired_at(key, now)
    }

    /// Full purge, then the number of live entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn purge_expired(&self) -> usize {
        self.map.purge_expired()
    }

    pub fn stats(&self) -> MapStats {
        self.map.stats()
    }
}

impl<K: Hash + Eq, V: Clone> BoundedLookAheadMap<K, V> {
    // == Get ==
    /// Purges expired entries at the front, then looks up `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.lookup(key).ok_or_else(|| MapError::key_not_found(key))
    }

    /// Like [`get`](Self::get), returning `default` if absent or expired.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(key).unwrap_or(default)
    }

    fn lookup<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = entry::now();
        let mut inner = self.map.lock();
        inner.purge_front(self.lookahead, now);
        inner.lookup(key, now).cloned()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedLookAheadMap<K, V> {
    /// See [`ExpiringOrderedMap::iter`].
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.map.iter()
    }

    pub fn keys(&self) -> Vec<K> {
        self.map.keys()
    }

    pub fn values(&self) -> Vec<V> {
        self.map.values()
    }

    pub fn items(&self) -> Vec<(K, V)> {
        self.map.items()
    }
}

impl<K: Hash + Eq, V> Default for BoundedLookAheadMap<K, V> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<'a, K: Hash + Eq + Clone, V: Clone> IntoIterator for &'a BoundedLookAheadMap<K, V> {
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq + Debug, V: Debug> Debug for BoundedLookAheadMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedLookAheadMap")
            .field("lookahead", &self.lookahead)
            .field("map", &self.map)
            .finish()
    }
}

fn unsupported(operation: &'static str) -> MapError {
    warn!(operation, "rejected TTL change on bounded look-ahead map");
    MapError::UnsupportedOperation(operation)
}
