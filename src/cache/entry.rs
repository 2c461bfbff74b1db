//! Cache Entry Module
//!
//! Defines the record stored per key and the expiry-heap item used to
//! schedule TTL removal.

use std::cmp::Ordering;
use std::time::Instant;

// == Cache Entry ==
/// A single cached record: key, value, and an optional absolute expiry.
///
/// The expiry is fixed at insert or update time; updating a key pushes a
/// fresh heap item rather than mutating the deadline in place.
#[derive(Debug)]
pub struct Entry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The cached value
    pub value: V,
    /// Absolute expiry instant, None = never expires
    pub expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// Returns true if the entry's deadline is strictly in the past.
    ///
    /// An entry with no deadline never expires. The comparison is
    /// strict: an entry observed exactly at its deadline is still live.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => now > at,
            None => false,
        }
    }
}

// == Expiry Heap Item ==
/// One scheduled removal: a deadline and the key it governs.
///
/// The heap may hold items for keys that have since been removed or
/// re-added with a different deadline; those are tombstones and are
/// skipped during the clean pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireItem {
    /// The deadline this item fires at
    pub at: Instant,
    /// The key scheduled for removal
    pub key: String,
}

impl Ord for ExpireItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for ExpireItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_entry_no_deadline_never_expires() {
        let entry = Entry {
            key: "k".to_string(),
            value: "v".to_string(),
            expires_at: None,
        };
        assert!(!entry.is_expired(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_entry_expiry_is_strict() {
        let now = Instant::now();
        let entry = Entry {
            key: "k".to_string(),
            value: "v".to_string(),
            expires_at: Some(now),
        };

        // Exactly at the deadline the entry is still live.
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::from_millis(1)));
    }

    #[test]
    fn test_expire_item_orders_by_deadline() {
        let now = Instant::now();
        let early = ExpireItem {
            at: now,
            key: "a".to_string(),
        };
        let late = ExpireItem {
            at: now + Duration::from_secs(1),
            key: "b".to_string(),
        };
        assert!(early < late);
    }

    #[test]
    fn test_expire_item_ties_break_on_key() {
        let now = Instant::now();
        let a = ExpireItem {
            at: now,
            key: "a".to_string(),
        };
        let b = ExpireItem {
            at: now,
            key: "b".to_string(),
        };
        assert!(a < b);
    }
}
