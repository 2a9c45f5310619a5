//! Store facade: keyed priority cache over arena, index, and heaps.
//!
//! `PriorityStore` wires the pieces together: one [`SlotArena`] owning every
//! entry, one [`SymbolIndex`] resolving symbols to per-symbol
//! [`PriorityHeap`]s, and a soft admission counter.
//!
//! ## Architecture
//!
//! ```text
//! insert(value, symbol, priority, expiry)
//!     │
//!     ├── 1. admission check (total_nodes < max_nodes)
//!     ├── 2. arena.claim_one() ──► SlotId
//!     ├── 3. arena.fill(id, Entry)
//!     ├── 4. index.get_or_create(symbol) ──► PriorityHeap
//!     └── 5. heap.push(id) ──► total_nodes += 1
//!
//! get_highest_priority(symbol)
//!     │
//!     ├── 1. index.get(symbol) ──► PriorityHeap
//!     └── 2. heap.pop_live() ──► EntryView (expired entries discarded)
//! ```
//!
//! ## Admission hazards
//!
//! - When the arena claim succeeds but the per-symbol heap is full, `insert`
//!   returns `false` with the claimed slot orphaned: the arena cursor has
//!   advanced, `total_nodes` has not. Bump allocation cannot hand the slot
//!   back.
//! - `insert_batch` admits all-or-nothing at the arena layer, but per-item
//!   heap pushes are best-effort: `total_nodes` advances by the full batch
//!   size even if some pushes hit a full heap.
//!
//! ## Example Usage
//!
//! ```
//! use tickcache::store::PriorityStore;
//!
//! let store = PriorityStore::new(1_000);
//! assert!(store.insert(150.75, "AAPL", 1, 60.0));
//! assert!(store.insert(151.00, "AAPL", 3, 60.0));
//!
//! let view = store.get_highest_priority("AAPL").unwrap();
//! assert_eq!(view.value, 151.00);
//! assert_eq!(view.priority, 3);
//! ```
//!
//! ## Thread Safety
//!
//! Every operation takes `&self`; share the store behind an `Arc` and call
//! it from any number of threads. No operation blocks on a lock.

use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "metrics")]
use crate::clock;
use crate::ds::entry::Entry;
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::ds::symbol_index::SymbolIndex;
use crate::error::ConfigError;

#[cfg(feature = "metrics")]
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSink, OpSample, StoreOp};

/// Expiry applied by [`PriorityStore::insert_with_default_expiry`] unless
/// reconfigured through the builder.
pub const DEFAULT_EXPIRY_SECONDS: f64 = 60.0;

/// Owned snapshot of a popped entry.
///
/// Decouples callers from arena slot lifetimes: the view stays valid after
/// the store has moved on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryView {
    /// Payload value.
    pub value: f64,
    /// Ordering key; larger means more urgent.
    pub priority: i32,
    /// Monotonic creation time in nanoseconds.
    pub timestamp_ns: u64,
    /// Lifetime in nanoseconds after `timestamp_ns`.
    pub expiry_ns: u64,
}

impl EntryView {
    /// Returns `true` if the viewed entry's lifetime has elapsed at `now_ns`.
    pub fn expired(&self, now_ns: u64) -> bool {
        now_ns.saturating_sub(self.timestamp_ns) > self.expiry_ns
    }
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            value: entry.value,
            priority: entry.priority,
            timestamp_ns: entry.timestamp_ns,
            expiry_ns: entry.expiry_ns,
        }
    }
}

/// Concurrent keyed priority cache.
///
/// Fixed capacity, volatile, in-process. See the module docs for the
/// admission pipeline and its documented hazards.
pub struct PriorityStore {
    arena: SlotArena,
    index: SymbolIndex,
    max_nodes: usize,
    heap_cap: usize,
    total_nodes: AtomicUsize,
    default_expiry_seconds: f64,
    #[cfg(feature = "metrics")]
    sink: Option<Arc<dyn MetricsSink>>,
}

impl PriorityStore {
    /// Creates a store for at most `max_nodes` entries with the default
    /// per-symbol heap capacity (`max_nodes / 10`, at least 1).
    ///
    /// # Panics
    ///
    /// Panics if `max_nodes` is zero; use [`Self::try_new`] to handle the
    /// error instead.
    pub fn new(max_nodes: usize) -> Self {
        match Self::try_new(max_nodes, None) {
            Ok(store) => store,
            Err(err) => panic!("invalid store configuration: {err}"),
        }
    }

    /// Creates a store, validating the configuration.
    ///
    /// `bucket_heap_cap` overrides the per-symbol heap capacity; `None`
    /// derives it as `max_nodes / 10`, clamped to at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_nodes` or an explicit
    /// `bucket_heap_cap` is zero.
    pub fn try_new(max_nodes: usize, bucket_heap_cap: Option<usize>) -> Result<Self, ConfigError> {
        if max_nodes == 0 {
            return Err(ConfigError::new("max_nodes must be > 0"));
        }
        if bucket_heap_cap == Some(0) {
            return Err(ConfigError::new("bucket_heap_cap must be > 0"));
        }
        let heap_cap = bucket_heap_cap.unwrap_or_else(|| (max_nodes / 10).max(1));
        Ok(Self {
            arena: SlotArena::with_capacity(max_nodes),
            index: SymbolIndex::new(),
            max_nodes,
            heap_cap,
            total_nodes: AtomicUsize::new(0),
            default_expiry_seconds: DEFAULT_EXPIRY_SECONDS,
            #[cfg(feature = "metrics")]
            sink: None,
        })
    }

    /// Attaches a metrics sink receiving one sample per operation.
    ///
    /// The store never blocks on the sink; implementations must return
    /// quickly.
    #[cfg(feature = "metrics")]
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub(crate) fn with_default_expiry(mut self, expiry_seconds: f64) -> Self {
        self.default_expiry_seconds = expiry_seconds;
        self
    }

    /// Inserts one record. Returns `false` if the store or the symbol's
    /// heap is full.
    ///
    /// `expiry_seconds` is converted to a nanosecond lifetime relative to
    /// the insert timestamp.
    pub fn insert(&self, value: f64, symbol: &str, priority: i32, expiry_seconds: f64) -> bool {
        #[cfg(feature = "metrics")]
        let start_ns = clock::now_ns();
        let admitted = self.insert_unrecorded(value, symbol, priority, expiry_seconds);
        #[cfg(feature = "metrics")]
        self.record(StoreOp::Insert, start_ns, admitted, false);
        admitted
    }

    /// Inserts one record with the store's default expiry.
    pub fn insert_with_default_expiry(&self, value: f64, symbol: &str, priority: i32) -> bool {
        self.insert(value, symbol, priority, self.default_expiry_seconds)
    }

    /// Inserts a batch of `(value, symbol, priority, expiry_seconds)`
    /// records with all-or-nothing admission.
    ///
    /// Returns `false`, with no slots claimed, if the batch would exceed
    /// `max_nodes`. Per-item heap pushes are best-effort once admitted; see
    /// the module docs.
    pub fn insert_batch(&self, items: &[(f64, &str, i32, f64)]) -> bool {
        #[cfg(feature = "metrics")]
        let start_ns = clock::now_ns();
        let admitted = self.insert_batch_unrecorded(items);
        #[cfg(feature = "metrics")]
        self.record(StoreOp::InsertBatch, start_ns, admitted, false);
        admitted
    }

    /// Pops the highest-priority live record for `symbol`.
    ///
    /// Expired records encountered on the way are discarded permanently.
    /// Returns `None` for unknown symbols and for heaps drained by the
    /// expiry screen; neither case mutates the index.
    pub fn get_highest_priority(&self, symbol: &str) -> Option<EntryView> {
        #[cfg(feature = "metrics")]
        let start_ns = clock::now_ns();
        let result = self.get_unrecorded(symbol);
        #[cfg(feature = "metrics")]
        self.record(StoreOp::Get, start_ns, true, result.is_some());
        result
    }

    /// Applies [`Self::get_highest_priority`] to each symbol in order.
    ///
    /// No cross-symbol atomicity: concurrent writers may interleave between
    /// elements.
    pub fn get_highest_priority_batch(&self, symbols: &[&str]) -> Vec<Option<EntryView>> {
        symbols
            .iter()
            .map(|symbol| self.get_highest_priority(symbol))
            .collect()
    }

    /// Returns the number of successfully admitted records.
    ///
    /// Soft counter: it can lag behind the arena cursor when inserts failed
    /// at the heap layer, and it counts batch items whose heap push failed.
    pub fn total_nodes(&self) -> usize {
        self.total_nodes.load(Ordering::Relaxed)
    }

    /// Returns the maximum number of records the store can hold.
    pub fn capacity(&self) -> usize {
        self.max_nodes
    }

    /// Returns the per-symbol heap capacity.
    pub fn bucket_heap_cap(&self) -> usize {
        self.heap_cap
    }

    /// Returns the number of symbols ever inserted (full index scan).
    pub fn symbol_count(&self) -> usize {
        self.index.len()
    }

    /// Returns the expiry used by [`Self::insert_with_default_expiry`].
    pub fn default_expiry_seconds(&self) -> f64 {
        self.default_expiry_seconds
    }

    fn insert_unrecorded(
        &self,
        value: f64,
        symbol: &str,
        priority: i32,
        expiry_seconds: f64,
    ) -> bool {
        if self.total_nodes.load(Ordering::Relaxed) >= self.max_nodes {
            return false;
        }
        let Some(id) = self.arena.claim_one() else {
            return false;
        };
        self.arena.fill(id, Entry::new(value, priority, expiry_seconds));
        let heap = self.index.get_or_create(symbol, self.heap_cap);
        if heap.push(&self.arena, id).is_ok() {
            self.total_nodes.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            // Heap full: the claimed slot is orphaned (see module docs).
            false
        }
    }

    fn insert_batch_unrecorded(&self, items: &[(f64, &str, i32, f64)]) -> bool {
        let count = items.len();
        if self.total_nodes.load(Ordering::Relaxed) + count > self.max_nodes {
            return false;
        }
        let Some(range) = self.arena.claim_many(count) else {
            return false;
        };
        for ((value, symbol, priority, expiry_seconds), index) in items.iter().zip(range) {
            let id = SlotId(index);
            self.arena
                .fill(id, Entry::new(*value, *priority, *expiry_seconds));
            let _ = self
                .index
                .get_or_create(symbol, self.heap_cap)
                .push(&self.arena, id);
        }
        self.total_nodes.fetch_add(count, Ordering::Relaxed);
        true
    }

    fn get_unrecorded(&self, symbol: &str) -> Option<EntryView> {
        let heap = self.index.get(symbol)?;
        let id = heap.pop_live(&self.arena)?;
        Some(EntryView::from(self.arena.get(id)))
    }

    #[cfg(feature = "metrics")]
    fn record(&self, op: StoreOp, start_ns: u64, success: bool, hit: bool) {
        if let Some(sink) = &self.sink {
            sink.record(OpSample {
                op,
                latency_ns: clock::now_ns().saturating_sub(start_ns),
                success,
                hit,
            });
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.total_nodes() <= self.max_nodes);
        assert!(self.total_nodes() <= self.arena.claimed());
        self.index.debug_validate_invariants();
    }
}

impl std::fmt::Debug for PriorityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityStore")
            .field("max_nodes", &self.max_nodes)
            .field("heap_cap", &self.heap_cap)
            .field("total_nodes", &self.total_nodes())
            .field("symbols", &self.symbol_count())
            .finish()
    }
}
