//! Bounded lock-free max-heap over arena slot ids.
//!
//! The heap stores [`SlotId`]s, never entries: the arena owns every record
//! and the heap's cells stay machine-word sized, which keeps the CAS traffic
//! cheap. Priorities are read through the arena during sifts.
//!
//! ## Architecture
//!
//! ```text
//!   cells: [AtomicUsize; cap]    0 = empty, n = slot id n-1
//!   len:   AtomicUsize
//!
//!   index:   0
//!          /   \
//!         1     2        parent(i) = (i-1)/2
//!        / \   / \       children(i) = 2i+1, 2i+2
//!       3   4 5   6
//! ```
//!
//! ## Operations
//! - `push`: admit via CAS on `len`, publish the cell with a Release store,
//!   then best-effort sift-up
//! - `pop`: take the root observed at the successful `len` decrement, move
//!   the last cell to the root, best-effort sift-down
//! - `pop_live`: `pop` that discards expired entries
//!
//! ## Contention contract
//!
//! Sift-up and sift-down rebalance with pair swaps: two CAS operations on the
//! parent and child cells. If either CAS loses a race the sift aborts rather
//! than restarting, so a contended heap can be transiently out of order; a
//! later push or pop along the same path repairs it. The ordering invariant
//! (every parent's priority >= its children's) is therefore a quiescence
//! contract, checked by `debug_validate_invariants`, not a per-step
//! linearizability guarantee.
//!
//! ## Memory ordering
//!
//! `len` uses Acquire loads and AcqRel RMWs. Cell stores that publish a new
//! id use Release; cell loads use Acquire. A popper that observes an id
//! therefore also observes the completed arena fill for that id.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::clock;
use crate::ds::slot_arena::{SlotArena, SlotId};

/// Empty-cell sentinel; occupied cells hold `slot index + 1`.
const EMPTY: usize = 0;

#[inline]
fn encode(id: SlotId) -> usize {
    id.index() + 1
}

#[inline]
fn decode(cell: usize) -> Option<SlotId> {
    (cell != EMPTY).then(|| SlotId(cell - 1))
}

/// Error returned when pushing into a heap at capacity.
///
/// The heap never grows; admission failure is terminal for the operation and
/// leaves the heap unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapFull;

impl fmt::Display for HeapFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("per-symbol heap is at capacity")
    }
}

impl std::error::Error for HeapFull {}

/// Bounded lock-free max-heap of [`SlotId`]s ordered by entry priority.
///
/// All operations are thread-safe and non-blocking; contended CAS loops
/// yield to the scheduler between retries.
pub struct PriorityHeap {
    cells: Box<[AtomicUsize]>,
    len: AtomicUsize,
}

impl PriorityHeap {
    /// Creates an empty heap holding at most `capacity` ids.
    pub fn with_capacity(capacity: usize) -> Self {
        let cells = (0..capacity).map(|_| AtomicUsize::new(EMPTY)).collect();
        Self {
            cells,
            len: AtomicUsize::new(0),
        }
    }

    /// Pushes a slot id, or fails with [`HeapFull`] at capacity.
    ///
    /// The entry behind `id` must be filled before the call; the Release
    /// store here is what publishes the fill to poppers.
    pub fn push(&self, arena: &SlotArena, id: SlotId) -> Result<(), HeapFull> {
        loop {
            let len = self.len.load(Ordering::Acquire);
            if len >= self.cells.len() {
                return Err(HeapFull);
            }
            if self
                .len
                .compare_exchange_weak(len, len + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.cells[len].store(encode(id), Ordering::Release);
                self.sift_up(arena, len);
                return Ok(());
            }
            thread::yield_now();
        }
    }

    /// Pops the root id, or `None` when empty.
    ///
    /// Returns the id that occupied the root at the instant of the
    /// successful `len` decrement. No expiry screening; see [`Self::pop_live`].
    pub fn pop(&self, arena: &SlotArena) -> Option<SlotId> {
        loop {
            let len = self.len.load(Ordering::Acquire);
            if len == 0 {
                return None;
            }
            let top = self.cells[0].load(Ordering::Acquire);
            let Some(top_id) = decode(top) else {
                // A concurrent push won the len CAS but has not published
                // its cell yet.
                thread::yield_now();
                continue;
            };
            if self
                .len
                .compare_exchange_weak(len, len - 1, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                thread::yield_now();
                continue;
            }
            let last = self.cells[len - 1].swap(EMPTY, Ordering::AcqRel);
            if len > 1 {
                self.cells[0].store(last, Ordering::Release);
                self.sift_down(arena, 0, len - 1);
            }
            return Some(top_id);
        }
    }

    /// Pops until a non-expired entry surfaces, or the heap drains.
    ///
    /// Expired ids are discarded; their arena slots are not reclaimed.
    pub fn pop_live(&self, arena: &SlotArena) -> Option<SlotId> {
        while let Some(id) = self.pop(arena) {
            if !arena.get(id).expired(clock::now_ns()) {
                return Some(id);
            }
        }
        None
    }

    /// Returns the number of ids currently admitted.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if no ids are admitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn sift_up(&self, arena: &SlotArena, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            let child_cell = self.cells[index].load(Ordering::Acquire);
            let parent_cell = self.cells[parent].load(Ordering::Acquire);
            let (Some(child_id), Some(parent_id)) = (decode(child_cell), decode(parent_cell))
            else {
                break;
            };
            if arena.get(parent_id).priority >= arena.get(child_id).priority {
                break;
            }
            // Pair swap: both CAS must land or the sift aborts and leaves a
            // transient ordering violation for a later op to repair.
            if self.cells[parent]
                .compare_exchange(parent_cell, child_cell, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
                && self.cells[index]
                    .compare_exchange(child_cell, parent_cell, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&self, arena: &SlotArena, mut index: usize, size: usize) {
        loop {
            let current_cell = self.cells[index].load(Ordering::Acquire);
            let Some(current_id) = decode(current_cell) else {
                return;
            };
            let mut max_index = index;
            let mut max_priority = arena.get(current_id).priority;

            let left = 2 * index + 1;
            if left < size {
                if let Some(id) = decode(self.cells[left].load(Ordering::Acquire)) {
                    if arena.get(id).priority > max_priority {
                        max_index = left;
                        max_priority = arena.get(id).priority;
                    }
                }
            }
            let right = 2 * index + 2;
            if right < size {
                if let Some(id) = decode(self.cells[right].load(Ordering::Acquire)) {
                    if arena.get(id).priority > max_priority {
                        max_index = right;
                    }
                }
            }
            if max_index == index {
                return;
            }

            let max_cell = self.cells[max_index].load(Ordering::Acquire);
            if decode(max_cell).is_none() {
                return;
            }
            if self.cells[index]
                .compare_exchange(current_cell, max_cell, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
                && self.cells[max_index]
                    .compare_exchange(max_cell, current_cell, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                index = max_index;
            } else {
                return;
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self, arena: &SlotArena) {
        let len = self.len.load(Ordering::Acquire);
        assert!(len <= self.cells.len());

        for index in 0..len {
            let cell = self.cells[index].load(Ordering::Acquire);
            let id = decode(cell).expect("occupied region holds an id at quiescence");
            if index > 0 {
                let parent = (index - 1) / 2;
                let parent_id = decode(self.cells[parent].load(Ordering::Acquire))
                    .expect("occupied region holds an id at quiescence");
                assert!(
                    arena.get(parent_id).priority >= arena.get(id).priority,
                    "heap ordering violated at index {index}",
                );
            }
        }
        for index in len..self.cells.len() {
            assert_eq!(self.cells[index].load(Ordering::Acquire), EMPTY);
        }
    }
}

impl fmt::Debug for PriorityHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityHeap")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
