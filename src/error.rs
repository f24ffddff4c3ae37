//! Error types and handling infrastructure for logsieve.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types and `anyhow` for application-level error handling with context.
//!
//! Pattern compile failures are deliberately absent from this taxonomy: a filter or
//! request pattern that fails to compile degrades to fail-open matching inside the
//! pattern cache and is never surfaced as an error.

use thiserror::Error;

/// The main error type for logsieve operations.
///
/// This enum covers the error conditions that can occur while constructing a
/// session, dispatching commands across the worker boundary, and waiting for
/// correlated responses.
#[derive(Error, Debug)]
pub enum LogsieveError {
    /// Parser/tracker configuration is invalid (bad rule regex, empty set)
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A request was issued before the engine signalled readiness
    #[error("Engine is not ready to accept requests")]
    NotReady,

    /// No response arrived for a correlation id within the caller's deadline
    #[error("Request {sequence_id} timed out waiting for a response")]
    Timeout { sequence_id: u64 },

    /// The worker side of the command channel is gone
    #[error("Engine channel closed")]
    ChannelClosed,

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for logsieve operations.
///
/// This type alias provides a consistent error handling interface across
/// all modules in the logsieve codebase.
pub type Result<T> = std::result::Result<T, LogsieveError>;

impl LogsieveError {
    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
