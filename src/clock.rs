//! Monotonic nanosecond clock shared by timestamps and expiry checks.
//!
//! Entry timestamps and the `now` used by expiry predicates must come from
//! the same clock, or expiry arithmetic silently mixes time sources. This
//! module pins a single process-local epoch on first use.

use std::sync::OnceLock;
use std::time::Instant;

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Returns nanoseconds elapsed since an arbitrary process-local epoch.
///
/// Monotonic: successive calls never go backwards.
///
/// # Example
///
/// ```
/// use tickcache::clock;
///
/// let a = clock::now_ns();
/// let b = clock::now_ns();
/// assert!(b >= a);
/// ```
pub fn now_ns() -> u64 {
    epoch().elapsed().as_nanos() as u64
}
