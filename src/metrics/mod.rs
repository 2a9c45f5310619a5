//! Push-style operation metrics for the store.
//!
//! The store emits one [`OpSample`] per operation at a [`MetricsSink`]. The
//! sink is optional, never blocks the hot path, and is decoupled from
//! consumption: [`CountingSink`] aggregates into a [`MetricsSnapshot`] for
//! monitoring, [`VecSink`] buffers raw samples for tests and benches.

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use metrics_impl::{CountingSink, VecSink};
pub use snapshot::MetricsSnapshot;
pub use traits::{MetricsSink, NullSink, OpSample, StoreOp};
