//! Error types for blaeck-tcp
//!
//! Provides a unified error type for all fallible operations. Most protocol
//! failures are silent (type mismatches, truncated frames, lookups
//! of unknown names) and never surface here.

use thiserror::Error;

/// Result type alias using BlaeckError
pub type Result<T> = std::result::Result<T, BlaeckError>;

/// Unified error type for blaeck-tcp operations
#[derive(Debug, Error)]
pub enum BlaeckError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Registry Errors
    // -------------------------------------------------------------------------
    #[error("Signal capacity exceeded (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
