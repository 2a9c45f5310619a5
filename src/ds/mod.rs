pub mod entry;
pub mod priority_heap;
pub mod slot_arena;
pub mod symbol_index;

pub use entry::Entry;
pub use priority_heap::{HeapFull, PriorityHeap};
pub use slot_arena::{SlotArena, SlotId};
pub use symbol_index::{SymbolIndex, BUCKETS};
