//! Error types for the tickcache library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (debug-only `debug_validate_invariants` methods).
//! - [`ConfigError`]: Returned when store configuration parameters are invalid
//!   (e.g. zero capacity, zero per-symbol heap capacity).
//!
//! ## Example Usage
//!
//! ```
//! use tickcache::error::ConfigError;
//! use tickcache::store::PriorityStore;
//!
//! // Fallible constructor for user-configurable parameters
//! let store: Result<PriorityStore, ConfigError> = PriorityStore::try_new(1000, None);
//! assert!(store.is_ok());
//!
//! // Invalid capacity is caught without panicking
//! let bad = PriorityStore::try_new(0, None);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal store invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when store configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`PriorityStore::try_new`](crate::store::PriorityStore::try_new) and
/// [`StoreBuilder::try_build`](crate::builder::StoreBuilder::try_build).
///
/// # Example
///
/// ```
/// use tickcache::store::PriorityStore;
///
/// let err = PriorityStore::try_new(0, None).unwrap_err();
/// assert!(err.to_string().contains("max_nodes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("heap ordering violated");
        assert_eq!(err.to_string(), "heap ordering violated");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn invariant_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("max_nodes must be > 0");
        assert_eq!(err.to_string(), "max_nodes must be > 0");
    }

    #[test]
    fn config_debug_includes_message() {
        let err = ConfigError::new("bad heap capacity");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("bad heap capacity"));
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
