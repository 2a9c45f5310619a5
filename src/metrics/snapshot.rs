//! Point-in-time view of aggregated store metrics.

/// Snapshot of the counters kept by
/// [`CountingSink`](crate::metrics::CountingSink).
///
/// All fields are cumulative since sink creation.
///
/// # Example
///
/// ```
/// use tickcache::metrics::MetricsSnapshot;
///
/// let snapshot = MetricsSnapshot {
///     inserts: 90,
///     insert_failures: 10,
///     batches: 2,
///     batch_failures: 0,
///     gets: 80,
///     hits: 60,
///     misses: 20,
///     samples: 172,
///     total_latency_ns: 86_000,
/// };
/// assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
/// assert_eq!(snapshot.mean_latency_ns(), 500);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful single-record inserts.
    pub inserts: u64,
    /// Single-record inserts rejected by admission or a full heap.
    pub insert_failures: u64,
    /// Admitted batch inserts.
    pub batches: u64,
    /// Batches rejected at the admission precheck.
    pub batch_failures: u64,
    /// Highest-priority lookups.
    pub gets: u64,
    /// Lookups that produced a record.
    pub hits: u64,
    /// Lookups that produced nothing.
    pub misses: u64,
    /// Total samples received.
    pub samples: u64,
    /// Sum of per-operation latencies in nanoseconds.
    pub total_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Fraction of gets that hit, or 0.0 with no gets recorded.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            return 0.0;
        }
        self.hits as f64 / self.gets as f64
    }

    /// Mean per-operation latency in nanoseconds, or 0 with no samples.
    pub fn mean_latency_ns(&self) -> u64 {
        if self.samples == 0 {
            return 0;
        }
        self.total_latency_ns / self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_rates_are_zero() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.hit_rate(), 0.0);
        assert_eq!(snapshot.mean_latency_ns(), 0);
    }

    #[test]
    fn hit_rate_uses_gets_as_denominator() {
        let snapshot = MetricsSnapshot {
            gets: 4,
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
