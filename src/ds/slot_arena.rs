//! Fixed-capacity slot arena with a lock-free bump cursor.
//!
//! Slots are preallocated at construction and handed out by a monotonically
//! increasing atomic cursor. There is no free list and no per-slot release:
//! a claimed slot stays claimed for the arena's lifetime. This trades
//! reclamation for wait-free admission and removes ABA hazards from the
//! structures that hold `SlotId`s.
//!
//! ## Architecture
//!
//! ```text
//!   slots: [Entry; capacity]   (preallocated, default-initialized)
//!   next:  AtomicUsize
//!
//!   index: 0     1     2     3     4
//!          [E]   [E]   [E]   [ ]   [ ]
//!                              ^
//!                              |
//!                       next = 3 (bump only, never decremented)
//! ```
//!
//! ## Operations
//! - `claim_one()` / `claim_many(k)`: fetch-add on the cursor; fail once the
//!   arena is exhausted (the cursor overshoot is deliberate and permanent)
//! - `fill(id, entry)`: writes a claimed slot exactly once
//! - `get(id)`: read-only access after the fill
//!
//! ## Write-once protocol
//!
//! A slot is mutated only by the thread that claimed it, before its `SlotId`
//! is published to any shared structure. Publication goes through a Release
//! store in the consumer (the per-symbol heap), so readers that obtained the
//! id through an Acquire load observe the completed fill.

use std::cell::UnsafeCell;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ds::entry::Entry;

/// Handle to one slot in a [`SlotArena`].
///
/// Ids are dense indices assigned in claim order and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the underlying slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

struct SlotCell(UnsafeCell<Entry>);

// SAFETY: a cell is written only by the thread that claimed its index, before
// the id is published to any shared structure; after publication all accesses
// are reads. The claim cursor hands each index to exactly one thread.
unsafe impl Sync for SlotCell {}

/// Bump-allocated arena of [`Entry`] slots.
///
/// The arena is the single owner of every entry; consumers hold `SlotId`s,
/// never references, so their atomic cells stay machine-word sized.
pub struct SlotArena {
    slots: Box<[SlotCell]>,
    next: AtomicUsize,
}

impl SlotArena {
    /// Creates an arena with `capacity` preallocated, default-initialized
    /// slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| SlotCell(UnsafeCell::new(Entry::default())))
            .collect();
        Self {
            slots,
            next: AtomicUsize::new(0),
        }
    }

    /// Claims the next free slot, or `None` once the arena is exhausted.
    ///
    /// A failed claim still advances the cursor; exhaustion is permanent.
    pub fn claim_one(&self) -> Option<SlotId> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        (index < self.slots.len()).then_some(SlotId(index))
    }

    /// Claims `count` contiguous slots, all or nothing.
    ///
    /// Returns the claimed index range on success. On failure the cursor has
    /// still advanced by `count` and the arena is exhausted for any request
    /// that no longer fits.
    pub fn claim_many(&self, count: usize) -> Option<Range<usize>> {
        let start = self.next.fetch_add(count, Ordering::Relaxed);
        let end = start.checked_add(count)?;
        (end <= self.slots.len()).then(|| start..end)
    }

    /// Fills a claimed slot.
    ///
    /// Must be called exactly once per claimed id, by the claiming thread,
    /// before the id is published to any shared structure.
    pub fn fill(&self, id: SlotId, entry: Entry) {
        debug_assert!(id.0 < self.next.load(Ordering::Relaxed));
        // SAFETY: the cursor handed `id` to exactly one thread and that
        // thread writes the slot once before publishing the id (write-once
        // protocol above).
        unsafe { *self.slots[id.0].0.get() = entry };
    }

    /// Returns a shared reference to the entry at `id`.
    pub fn get(&self, id: SlotId) -> &Entry {
        // SAFETY: slots are immutable once their id has been published; the
        // fill happened-before any read via the consumer's Release/Acquire
        // pair (write-once protocol above).
        unsafe { &*self.slots[id.0].0.get() }
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of slots claimed so far, capped at capacity.
    pub fn claimed(&self) -> usize {
        self.next.load(Ordering::Relaxed).min(self.slots.len())
    }

    /// Returns `true` once no further claims can succeed.
    pub fn is_exhausted(&self) -> bool {
        self.next.load(Ordering::Relaxed) >= self.slots.len()
    }
}

impl std::fmt::Debug for SlotArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotArena")
            .field("capacity", &self.capacity())
            .field("claimed", &self.claimed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn claim_fill_read_roundtrip() {
        let arena = SlotArena::with_capacity(4);
        let id = arena.claim_one().unwrap();
        arena.fill(id, Entry::new(150.75, 3, 60.0));

        let entry = arena.get(id);
        assert_eq!(entry.value, 150.75);
        assert_eq!(entry.priority, 3);
    }

    #[test]
    fn claims_are_dense_and_bounded() {
        let arena = SlotArena::with_capacity(3);
        assert_eq!(arena.claim_one().map(SlotId::index), Some(0));
        assert_eq!(arena.claim_one().map(SlotId::index), Some(1));
        assert_eq!(arena.claim_one().map(SlotId::index), Some(2));
        assert!(arena.claim_one().is_none());
        assert!(arena.is_exhausted());
        assert_eq!(arena.claimed(), 3);
    }

    #[test]
    fn exhaustion_is_permanent() {
        let arena = SlotArena::with_capacity(1);
        assert!(arena.claim_one().is_some());
        assert!(arena.claim_one().is_none());
        // The overshoot is never rolled back.
        assert!(arena.claim_one().is_none());
        assert!(arena.claim_many(1).is_none());
    }

    #[test]
    fn claim_many_is_all_or_nothing() {
        let arena = SlotArena::with_capacity(10);
        assert_eq!(arena.claim_many(4), Some(0..4));
        assert_eq!(arena.claim_many(4), Some(4..8));
        // Only 2 slots left; the request fails but still burns the cursor.
        assert!(arena.claim_many(4).is_none());
        assert!(arena.is_exhausted());
    }

    #[test]
    fn claim_many_zero_is_trivially_satisfied() {
        let arena = SlotArena::with_capacity(2);
        assert_eq!(arena.claim_many(0), Some(0..0));
        assert_eq!(arena.claimed(), 0);
    }

    #[test]
    fn concurrent_claims_are_unique() {
        let arena = Arc::new(SlotArena::with_capacity(1_000));
        let threads = 8;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let arena = arena.clone();
                thread::spawn(move || {
                    let mut ids = Vec::new();
                    while let Some(id) = arena.claim_one() {
                        ids.push(id.index());
                    }
                    ids
                })
            })
            .collect();

        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all.len(), 1_000);
        for (expected, actual) in all.iter().enumerate() {
            assert_eq!(expected, *actual);
        }
        assert!(arena.is_exhausted());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // =============================================================================
    // Property Tests - Claim Accounting
    // =============================================================================

    proptest! {
        /// Property: single claims succeed exactly `capacity` times
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_claim_one_respects_capacity(capacity in 1usize..256) {
            let arena = SlotArena::with_capacity(capacity);

            for expected in 0..capacity {
                let id = arena.claim_one();
                prop_assert_eq!(id.map(SlotId::index), Some(expected));
            }
            prop_assert!(arena.claim_one().is_none());
            prop_assert_eq!(arena.claimed(), capacity);
        }

        /// Property: claim_many hands out disjoint contiguous ranges
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_claim_many_ranges_disjoint(
            capacity in 1usize..256,
            requests in prop::collection::vec(1usize..16, 1..32)
        ) {
            let arena = SlotArena::with_capacity(capacity);
            let mut granted: Vec<std::ops::Range<usize>> = Vec::new();

            for request in requests {
                if let Some(range) = arena.claim_many(request) {
                    prop_assert_eq!(range.len(), request);
                    prop_assert!(range.end <= capacity);
                    if let Some(previous) = granted.last() {
                        prop_assert!(range.start >= previous.end);
                    }
                    granted.push(range);
                }
            }

            let total: usize = granted.iter().map(|r| r.len()).sum();
            prop_assert!(total <= capacity);
        }

        /// Property: filled slots read back what was written
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_fill_read_roundtrip(
            values in prop::collection::vec((any::<f64>(), any::<i32>()), 1..64)
        ) {
            let arena = SlotArena::with_capacity(values.len());

            let ids: Vec<SlotId> = values
                .iter()
                .map(|(value, priority)| {
                    let id = arena.claim_one().unwrap();
                    arena.fill(id, Entry {
                        value: *value,
                        priority: *priority,
                        timestamp_ns: 0,
                        expiry_ns: 0,
                    });
                    id
                })
                .collect();

            for (id, (value, priority)) in ids.iter().zip(&values) {
                let entry = arena.get(*id);
                prop_assert_eq!(entry.value.to_bits(), value.to_bits());
                prop_assert_eq!(entry.priority, *priority);
            }
        }
    }
}
