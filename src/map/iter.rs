//! Lazy Iteration Module
//!
//! Walks a key snapshot, checking expiry one key at a time.

use std::hash::Hash;
use std::iter::FusedIterator;

use crate::map::entry;
use crate::map::ExpiringOrderedMap;

// == Iter ==
/// Single-pass iterator over the live entries of an [`ExpiringOrderedMap`].
///
/// Created by [`ExpiringOrderedMap::iter`]. Keys are fixed at creation;
/// each step locks the map, purges the next key if it has expired and
/// yields it otherwise.
pub struct Iter<'a, K, V> {
    map: &'a ExpiringOrderedMap<K, V>,
    keys: std::vec::IntoIter<K>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(map: &'a ExpiringOrderedMap<K, V>, keys: Vec<K>) -> Self {
        Self {
            map,
            keys: keys.into_iter(),
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Iterator for Iter<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let now = entry::now();
        let mut inner = self.map.lock();
        for key in self.keys.by_ref() {
            // Keys deleted since the snapshot was taken are skipped too
            if let Some(live) = inner.live_entry_mut(&key, now) {
                let value = live.value.clone();
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}

impl<K: Hash + Eq + Clone, V: Clone> FusedIterator for Iter<'_, K, V> {}
