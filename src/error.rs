//! Error types for prefixkv
//!
//! Provides a unified error type for all store operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for store operations
///
/// Errors produced by a wrapped store are forwarded verbatim by the
/// prefix layer, never reinterpreted or wrapped. `Closed` is permanent:
/// once a store reports it, every later call on that instance reports it
/// too, so callers must treat it as non-retryable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Underlying Store Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
