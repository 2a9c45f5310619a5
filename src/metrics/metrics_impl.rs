//! Provided sink implementations.
//!
//! - [`CountingSink`]: lock-free atomic counters for production monitoring;
//!   read through [`MetricsSnapshot`].
//! - [`VecSink`]: buffers raw samples behind a mutex; for tests and benches,
//!   not the hot path of a latency-sensitive deployment.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::metrics::snapshot::MetricsSnapshot;
use crate::metrics::traits::{MetricsSink, OpSample, StoreOp};

/// Sink that aggregates samples into atomic counters.
///
/// All counter updates are `Relaxed`: metrics are observational and never
/// ordered against store operations.
#[derive(Debug, Default)]
pub struct CountingSink {
    inserts: AtomicU64,
    insert_failures: AtomicU64,
    batches: AtomicU64,
    batch_failures: AtomicU64,
    gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    samples: AtomicU64,
    total_latency_ns: AtomicU64,
}

impl CountingSink {
    /// Creates a sink with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            insert_failures: self.insert_failures.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            total_latency_ns: self.total_latency_ns.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for CountingSink {
    fn record(&self, sample: OpSample) {
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(sample.latency_ns, Ordering::Relaxed);
        match sample.op {
            StoreOp::Insert => {
                if sample.success {
                    self.inserts.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.insert_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            StoreOp::InsertBatch => {
                if sample.success {
                    self.batches.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.batch_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            StoreOp::Get => {
                self.gets.fetch_add(1, Ordering::Relaxed);
                if sample.hit {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

/// Sink that buffers every sample in order of arrival.
#[derive(Debug, Default)]
pub struct VecSink {
    samples: Mutex<Vec<OpSample>>,
}

impl VecSink {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of buffered samples.
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Removes and returns all buffered samples.
    pub fn drain(&self) -> Vec<OpSample> {
        std::mem::take(&mut *self.samples.lock())
    }
}

impl MetricsSink for VecSink {
    fn record(&self, sample: OpSample) {
        self.samples.lock().push(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(op: StoreOp, success: bool, hit: bool) -> OpSample {
        OpSample {
            op,
            latency_ns: 100,
            success,
            hit,
        }
    }

    #[test]
    fn counting_sink_routes_by_op_and_outcome() {
        let sink = CountingSink::new();
        sink.record(sample(StoreOp::Insert, true, false));
        sink.record(sample(StoreOp::Insert, false, false));
        sink.record(sample(StoreOp::InsertBatch, true, false));
        sink.record(sample(StoreOp::Get, true, true));
        sink.record(sample(StoreOp::Get, true, false));

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.inserts, 1);
        assert_eq!(snapshot.insert_failures, 1);
        assert_eq!(snapshot.batches, 1);
        assert_eq!(snapshot.batch_failures, 0);
        assert_eq!(snapshot.gets, 2);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.samples, 5);
        assert_eq!(snapshot.total_latency_ns, 500);
        assert_eq!(snapshot.mean_latency_ns(), 100);
    }

    #[test]
    fn vec_sink_preserves_arrival_order() {
        let sink = VecSink::new();
        sink.record(sample(StoreOp::Insert, true, false));
        sink.record(sample(StoreOp::Get, true, true));
        assert_eq!(sink.len(), 2);

        let samples = sink.drain();
        assert_eq!(samples[0].op, StoreOp::Insert);
        assert_eq!(samples[1].op, StoreOp::Get);
        assert!(sink.is_empty());
    }

    #[test]
    fn counting_sink_is_shareable_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(CountingSink::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        sink.record(sample(StoreOp::Get, true, true));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.gets, 400);
        assert_eq!(snapshot.hits, 400);
    }
}
