//! Map Entry Module
//!
//! Defines the stored form of a value together with its expiration deadline.

use chrono::{DateTime, Duration, Utc};

/// Absolute point in time used for expiry deadlines.
pub type Timestamp = DateTime<Utc>;

// == Entry ==
/// A single stored value and its optional expiry deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    /// Expiration deadline, None = never expires
    pub expires_at: Option<Timestamp>,
    /// The stored value
    pub value: V,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an entry expiring `ttl` after `now`, or never if `ttl` is None.
    pub fn new(value: V, ttl: Option<Duration>, now: Timestamp) -> Self {
        Self {
            expires_at: ttl.map(|ttl| deadline(now, ttl)),
            value,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is logically expired at `now`.
    ///
    /// The comparison is strict: an entry whose deadline equals `now` is
    /// still live.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.expires_at {
            Some(expires) => expires < now,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining time until expiry, negative once the deadline has passed.
    ///
    /// Returns None if the entry never expires.
    pub fn ttl_at(&self, now: Timestamp) -> Option<Duration> {
        self.expires_at.map(|expires| expires - now)
    }
}

// == Utility Functions ==
/// Returns the current UTC timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Adds `ttl` to `now`, saturating at the representable bounds.
pub(crate) fn deadline(now: Timestamp, ttl: Duration) -> Timestamp {
    now.checked_add_signed(ttl).unwrap_or(if ttl < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = Entry::new("test_value", None, now());

        assert_eq!(entry.value, "test_value");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired_at(now() + Duration::days(365 * 100)));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let created = now();
        let entry = Entry::new("test_value", Some(Duration::seconds(60)), created);

        assert_eq!(entry.expires_at, Some(created + Duration::seconds(60)));
        assert!(!entry.is_expired_at(created));
        assert!(entry.is_expired_at(created + Duration::seconds(61)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let created = now();
        let entry = Entry::new(1, Some(Duration::seconds(10)), created);
        let expires = created + Duration::seconds(10);

        // Live exactly at the deadline, expired right after
        assert!(!entry.is_expired_at(expires));
        assert!(entry.is_expired_at(expires + Duration::nanoseconds(1)));
    }

    #[test]
    fn test_ttl_at() {
        let created = now();
        let entry = Entry::new(1, Some(Duration::seconds(10)), created);

        assert_eq!(entry.ttl_at(created), Some(Duration::seconds(10)));
        assert_eq!(
            entry.ttl_at(created + Duration::seconds(15)),
            Some(Duration::seconds(-5))
        );
    }

    #[test]
    fn test_ttl_no_expiration() {
        let entry = Entry::new(1, None, now());
        assert!(entry.ttl_at(now()).is_none());
    }

    #[test]
    fn test_negative_ttl_is_already_expired() {
        let created = now();
        let entry = Entry::new(1, Some(Duration::seconds(-1)), created);
        assert!(entry.is_expired_at(created));
    }

    #[test]
    fn test_deadline_saturates() {
        let created = now();
        assert_eq!(deadline(created, Duration::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(deadline(created, Duration::MIN), DateTime::<Utc>::MIN_UTC);
    }
}
