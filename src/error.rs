//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// A lookup miss is not an error: `get` and `peek` return `None` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Caller supplied a malformed key, length or payload
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An internal structure was asked to do something its state forbids
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The payload buffer could not be reserved
    #[error("Allocation failed: could not reserve {bytes} bytes")]
    AllocationFailed {
        /// Number of bytes requested
        bytes: usize,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
