//! Single cache record: value, priority, and expiry bookkeeping.

use crate::clock;

/// One priced record in a symbol stream.
///
/// An entry is filled exactly once by the thread that claimed its arena slot
/// and is read-only afterwards. `expiry_ns` is a duration relative to
/// `timestamp_ns`, not an absolute deadline; both sides of the expiry check
/// use [`clock::now_ns`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Entry {
    /// Payload value (e.g. a price).
    pub value: f64,
    /// Ordering key; larger means more urgent.
    pub priority: i32,
    /// Monotonic creation time in nanoseconds.
    pub timestamp_ns: u64,
    /// Lifetime in nanoseconds after `timestamp_ns`.
    pub expiry_ns: u64,
}

impl Entry {
    /// Creates an entry stamped with the current monotonic time.
    pub fn new(value: f64, priority: i32, expiry_seconds: f64) -> Self {
        Self {
            value,
            priority,
            timestamp_ns: clock::now_ns(),
            expiry_ns: (expiry_seconds * 1_000_000_000.0) as u64,
        }
    }

    /// Returns `true` if the entry's lifetime has elapsed at `now_ns`.
    ///
    /// Timestamps come from a monotonic clock, so `now_ns` is never behind
    /// `timestamp_ns` for a published entry; the saturation only guards the
    /// check against a caller-supplied stale `now_ns`.
    #[inline]
    pub fn expired(&self, now_ns: u64) -> bool {
        now_ns.saturating_sub(self.timestamp_ns) > self.expiry_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_strict() {
        let entry = Entry {
            value: 1.0,
            priority: 0,
            timestamp_ns: 1_000,
            expiry_ns: 500,
        };
        assert!(!entry.expired(1_000));
        assert!(!entry.expired(1_500));
        assert!(entry.expired(1_501));
    }

    #[test]
    fn zero_expiry_dies_after_any_elapsed_time() {
        let entry = Entry {
            value: 1.0,
            priority: 0,
            timestamp_ns: 42,
            expiry_ns: 0,
        };
        assert!(!entry.expired(42));
        assert!(entry.expired(43));
    }

    #[test]
    fn stale_now_does_not_underflow() {
        let entry = Entry {
            value: 1.0,
            priority: 0,
            timestamp_ns: 1_000,
            expiry_ns: 0,
        };
        assert!(!entry.expired(999));
    }

    #[test]
    fn new_stamps_current_time_and_scales_expiry() {
        let before = crate::clock::now_ns();
        let entry = Entry::new(150.75, 3, 2.5);
        let after = crate::clock::now_ns();

        assert_eq!(entry.value, 150.75);
        assert_eq!(entry.priority, 3);
        assert!(entry.timestamp_ns >= before && entry.timestamp_ns <= after);
        assert_eq!(entry.expiry_ns, 2_500_000_000);
    }

    #[test]
    fn default_is_zeroed() {
        let entry = Entry::default();
        assert_eq!(entry.value, 0.0);
        assert_eq!(entry.priority, 0);
        assert_eq!(entry.timestamp_ns, 0);
        assert_eq!(entry.expiry_ns, 0);
    }
}
