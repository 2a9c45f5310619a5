pub use crate::builder::StoreBuilder;
pub use crate::ds::{Entry, HeapFull, PriorityHeap, SlotArena, SlotId, SymbolIndex};
pub use crate::error::ConfigError;
pub use crate::store::{EntryView, PriorityStore};

#[cfg(feature = "metrics")]
pub use crate::metrics::{CountingSink, MetricsSink, MetricsSnapshot, NullSink, OpSample, StoreOp};
