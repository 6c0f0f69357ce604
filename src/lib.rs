//! Expiring Map - a thread-safe, insertion-ordered in-memory map
//!
//! Entries carry an individual or default expiration deadline and are
//! purged lazily by the operations that observe them. There is no
//! background sweeper.

pub mod config;
pub mod error;
pub mod map;

pub use config::MapConfig;
pub use error::{MapError, Result};
pub use map::{BoundedLookAheadMap, ExpiringOrderedMap, MapStats, LOOKAHEAD_WINDOW};
