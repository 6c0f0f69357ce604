//! Map Statistics Module
//!
//! Tracks lookup outcomes and how many expired entries were purged.

use serde::Serialize;

// == Map Stats ==
/// Counters describing map activity since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapStats {
    /// Number of lookups that found a live value
    pub hits: u64,
    /// Number of lookups that found nothing or an expired value
    pub misses: u64,
    /// Number of expired entries physically removed
    pub purged: u64,
    /// Entries physically stored, including expired ones not yet purged
    pub stored_entries: usize,
}

impl MapStats {
    // == Constructor ==
    /// Creates a new MapStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_purged(&mut self, count: usize) {
        self.purged += count as u64;
    }
}
