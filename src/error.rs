//! Error types for the expiring map
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Map Error Enum ==
/// Errors returned by map operations.
///
/// Neither variant leaves the map in an inconsistent state; both are
/// caller-correctable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Key is absent or has logically expired
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Operation is not available on this map variant
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl MapError {
    /// Builds a `KeyNotFound` from any debuggable key.
    pub(crate) fn key_not_found<Q: std::fmt::Debug + ?Sized>(key: &Q) -> Self {
        MapError::KeyNotFound(format!("{:?}", key))
    }
}

// == Result Type Alias ==
/// Convenience Result type for map operations.
pub type Result<T> = std::result::Result<T, MapError>;
