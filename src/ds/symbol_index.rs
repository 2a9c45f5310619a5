//! Lock-free hash index from symbol to a per-symbol priority heap.
//!
//! A fixed array of buckets heads CAS-linked singly-linked chains. Chain
//! nodes own their symbol string and heap, and once installed are never
//! unlinked for the life of the index: symbols are sticky, which is what
//! makes lock-free traversal safe without deferred reclamation.
//!
//! ## Architecture
//!
//! ```text
//!   buckets: [AtomicPtr<ChainNode>; 64]
//!
//!   fnv1a(symbol) & 63
//!        │
//!        ▼
//!   [ head ] ─► ("AAPL", heap) ─► ("MSFT", heap) ─► null
//!   [ head ] ─► null
//!   [ head ] ─► ("TSLA", heap) ─► null
//! ```
//!
//! ## Operations
//! - `get_or_create`: traverse, then CAS-install a candidate node at the
//!   chain head; losing racers re-traverse, drop their candidate if the
//!   symbol appeared, and otherwise retry
//! - `get`: read-only traversal
//!
//! There is no resize: the bucket count is a compile-time constant and chain
//! length is observed, not bounded. A chain that outgrows
//! [`CHAIN_WARN_LEN`] is reported through `tracing` once per install.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::thread;

use crate::ds::priority_heap::PriorityHeap;

/// Number of hash buckets. Power of two so the fingerprint reduces by mask.
pub const BUCKETS: usize = 64;

const _: () = assert!(BUCKETS.is_power_of_two());

/// Chain length above which an install logs a distribution warning.
const CHAIN_WARN_LEN: usize = 16;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a fingerprint of the symbol bytes.
fn fingerprint(symbol: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in symbol.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[inline]
fn bucket_of(symbol: &str) -> usize {
    (fingerprint(symbol) as usize) & (BUCKETS - 1)
}

struct ChainNode {
    symbol: String,
    heap: PriorityHeap,
    next: AtomicPtr<ChainNode>,
}

/// Fixed-bucket lock-free hash table from symbol to [`PriorityHeap`].
///
/// At most one heap is ever installed per symbol, even under racing
/// `get_or_create` calls; chain nodes live until the index drops.
pub struct SymbolIndex {
    buckets: [AtomicPtr<ChainNode>; BUCKETS],
}

impl SymbolIndex {
    /// Creates an index with all buckets empty.
    pub fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
        }
    }

    /// Returns the heap for `symbol`, installing one of capacity `heap_cap`
    /// if the symbol is new.
    pub fn get_or_create(&self, symbol: &str, heap_cap: usize) -> &PriorityHeap {
        let bucket = &self.buckets[bucket_of(symbol)];
        if let Some(node) = self.find(bucket.load(Ordering::Acquire), symbol).0 {
            return &node.heap;
        }

        let mut candidate = Box::new(ChainNode {
            symbol: symbol.to_owned(),
            heap: PriorityHeap::with_capacity(heap_cap),
            next: AtomicPtr::new(ptr::null_mut()),
        });

        loop {
            let head = bucket.load(Ordering::Acquire);
            let (existing, chain_len) = self.find(head, symbol);
            if let Some(node) = existing {
                // Lost the race: another thread installed this symbol.
                // The candidate drops here.
                return &node.heap;
            }

            candidate.next.store(head, Ordering::Relaxed);
            let raw = Box::into_raw(candidate);
            match bucket.compare_exchange(head, raw, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => {
                    if chain_len >= CHAIN_WARN_LEN {
                        tracing::warn!(
                            symbol,
                            chain_len = chain_len + 1,
                            "symbol index chain exceeds expected length; \
                             bucket distribution is degenerate"
                        );
                    }
                    // SAFETY: the node was just installed and nodes are
                    // never unlinked while the index is alive, so the
                    // reference stays valid for the `&self` borrow.
                    return unsafe { &(*raw).heap };
                }
                Err(_) => {
                    // SAFETY: the CAS failed, so `raw` was never published
                    // and this thread still uniquely owns it.
                    candidate = unsafe { Box::from_raw(raw) };
                    thread::yield_now();
                }
            }
        }
    }

    /// Returns the heap for `symbol`, or `None` if the symbol was never
    /// inserted. Does not mutate the index.
    pub fn get(&self, symbol: &str) -> Option<&PriorityHeap> {
        let bucket = &self.buckets[bucket_of(symbol)];
        self.find(bucket.load(Ordering::Acquire), symbol)
            .0
            .map(|node| &node.heap)
    }

    /// Returns the number of installed symbols (full scan).
    pub fn len(&self) -> usize {
        let mut count = 0;
        for bucket in &self.buckets {
            let mut node = bucket.load(Ordering::Acquire);
            while !node.is_null() {
                count += 1;
                // SAFETY: chain nodes are never unlinked or freed while the
                // index is alive.
                node = unsafe { &*node }.next.load(Ordering::Acquire);
            }
        }
        count
    }

    /// Returns `true` if no symbols are installed.
    pub fn is_empty(&self) -> bool {
        self.buckets
            .iter()
            .all(|bucket| bucket.load(Ordering::Acquire).is_null())
    }

    /// Walks a chain looking for `symbol`; returns the match (if any) and
    /// the number of nodes visited before it.
    fn find<'a>(
        &'a self,
        mut node: *mut ChainNode,
        symbol: &str,
    ) -> (Option<&'a ChainNode>, usize) {
        let mut visited = 0;
        while !node.is_null() {
            // SAFETY: chain nodes are never unlinked or freed while the
            // index is alive, so any pointer read from a bucket or a `next`
            // link stays valid for the `&self` borrow.
            let node_ref = unsafe { &*node };
            if node_ref.symbol == symbol {
                return (Some(node_ref), visited);
            }
            visited += 1;
            node = node_ref.next.load(Ordering::Acquire);
        }
        (None, visited)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut seen = rustc_hash::FxHashSet::default();
        for (index, bucket) in self.buckets.iter().enumerate() {
            let mut node = bucket.load(Ordering::Acquire);
            while !node.is_null() {
                // SAFETY: see `find`.
                let node_ref = unsafe { &*node };
                assert_eq!(bucket_of(&node_ref.symbol), index);
                assert!(
                    seen.insert(node_ref.symbol.clone()),
                    "symbol {:?} installed more than once",
                    node_ref.symbol,
                );
                node = node_ref.next.load(Ordering::Acquire);
            }
        }
    }
}

impl Default for SymbolIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SymbolIndex {
    fn drop(&mut self) {
        for bucket in &self.buckets {
            let mut node = bucket.swap(ptr::null_mut(), Ordering::Relaxed);
            while !node.is_null() {
                // SAFETY: drop has exclusive access and every node was
                // created by Box::into_raw in get_or_create.
                let boxed = unsafe { Box::from_raw(node) };
                node = boxed.next.load(Ordering::Relaxed);
            }
        }
    }
}

impl std::fmt::Debug for SymbolIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolIndex")
            .field("buckets", &BUCKETS)
            .field("symbols", &self.len())
            .finish()
    }
}
