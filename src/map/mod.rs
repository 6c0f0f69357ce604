//! Map Module
//!
//! Provides the insertion-ordered map with lazy TTL expiration and its
//! bounded look-ahead variant.

mod entry;
mod iter;
mod lookahead;
mod stats;
mod store;


// Re-export public types
pub use entry::{now, Entry, Timestamp};
pub use iter::Iter;
pub use lookahead::BoundedLookAheadMap;
pub use stats::MapStats;
pub use store::ExpiringOrderedMap;

// == Public Constants ==
/// Default number of front entries the bounded look-ahead purge inspects
pub const LOOKAHEAD_WINDOW: usize = 5;
