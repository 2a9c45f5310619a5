pub mod priority;

pub use priority::{EntryView, PriorityStore};
