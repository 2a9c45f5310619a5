//! Validated configuration surface for [`PriorityStore`].
//!
//! Collects the knobs the direct constructors do not expose (default expiry,
//! metrics sink) and validates everything in one place.
//!
//! ## Example
//!
//! ```
//! use tickcache::builder::StoreBuilder;
//!
//! let store = StoreBuilder::new(1_000)
//!     .bucket_heap_cap(64)
//!     .default_expiry_seconds(5.0)
//!     .try_build()
//!     .unwrap();
//!
//! assert_eq!(store.capacity(), 1_000);
//! assert_eq!(store.bucket_heap_cap(), 64);
//! assert!(store.insert_with_default_expiry(150.75, "AAPL", 1));
//! ```

use crate::error::ConfigError;
use crate::store::priority::DEFAULT_EXPIRY_SECONDS;
use crate::store::PriorityStore;

#[cfg(feature = "metrics")]
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::MetricsSink;

/// Builder for [`PriorityStore`] instances.
pub struct StoreBuilder {
    max_nodes: usize,
    bucket_heap_cap: Option<usize>,
    default_expiry_seconds: f64,
    #[cfg(feature = "metrics")]
    sink: Option<Arc<dyn MetricsSink>>,
}

impl StoreBuilder {
    /// Starts a builder for a store holding at most `max_nodes` entries.
    pub fn new(max_nodes: usize) -> Self {
        Self {
            max_nodes,
            bucket_heap_cap: None,
            default_expiry_seconds: DEFAULT_EXPIRY_SECONDS,
            #[cfg(feature = "metrics")]
            sink: None,
        }
    }

    /// Overrides the per-symbol heap capacity (default `max_nodes / 10`,
    /// at least 1).
    pub fn bucket_heap_cap(mut self, cap: usize) -> Self {
        self.bucket_heap_cap = Some(cap);
        self
    }

    /// Sets the expiry used by
    /// [`PriorityStore::insert_with_default_expiry`].
    pub fn default_expiry_seconds(mut self, expiry_seconds: f64) -> Self {
        self.default_expiry_seconds = expiry_seconds;
        self
    }

    /// Attaches a metrics sink receiving one sample per operation.
    #[cfg(feature = "metrics")]
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validates the configuration and builds the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_nodes` or an explicit heap capacity
    /// is zero, or if the default expiry is negative or non-finite.
    pub fn try_build(self) -> Result<PriorityStore, ConfigError> {
        if !self.default_expiry_seconds.is_finite() || self.default_expiry_seconds < 0.0 {
            return Err(ConfigError::new(
                "default_expiry_seconds must be finite and >= 0",
            ));
        }
        let store = PriorityStore::try_new(self.max_nodes, self.bucket_heap_cap)?
            .with_default_expiry(self.default_expiry_seconds);
        #[cfg(feature = "metrics")]
        let store = match self.sink {
            Some(sink) => store.with_metrics_sink(sink),
            None => store,
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_every_knob() {
        let store = StoreBuilder::new(500)
            .bucket_heap_cap(25)
            .default_expiry_seconds(1.5)
            .try_build()
            .unwrap();

        assert_eq!(store.capacity(), 500);
        assert_eq!(store.bucket_heap_cap(), 25);
        assert_eq!(store.default_expiry_seconds(), 1.5);
    }

    #[test]
    fn builder_rejects_zero_capacity() {
        assert!(StoreBuilder::new(0).try_build().is_err());
    }

    #[test]
    fn builder_rejects_zero_heap_cap() {
        assert!(StoreBuilder::new(100).bucket_heap_cap(0).try_build().is_err());
    }

    #[test]
    fn builder_rejects_negative_expiry() {
        let err = StoreBuilder::new(100)
            .default_expiry_seconds(-1.0)
            .try_build()
            .unwrap_err();
        assert!(err.to_string().contains("default_expiry_seconds"));
    }

    #[test]
    fn builder_rejects_nan_expiry() {
        assert!(StoreBuilder::new(100)
            .default_expiry_seconds(f64::NAN)
            .try_build()
            .is_err());
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn builder_wires_the_metrics_sink() {
        use crate::metrics::VecSink;
        use std::sync::Arc;

        let sink = Arc::new(VecSink::new());
        let store = StoreBuilder::new(100)
            .metrics_sink(sink.clone())
            .try_build()
            .unwrap();

        assert!(store.insert(1.0, "A", 1, 60.0));
        assert_eq!(sink.len(), 1);
    }
}
