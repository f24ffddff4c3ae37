//! # logsieve - Incremental Log-Stream Indexing and Matching Engine
//!
//! An engine for log-viewing frontends: it ingests raw text in arbitrarily
//! sized fragments, splits them into rows while tolerating lines broken across
//! fragment boundaries, keeps a stable offset-to-row index as the stream
//! grows, and evaluates any number of concurrently active text/regex patterns
//! against every row with memoized document scans.
//!
//! ## Features
//!
//! - **Fragment-tolerant ingestion**: lines split across chunk boundaries are
//!   reassembled transparently
//! - **Append-only indexing**: offsets and match caches extend incrementally,
//!   never rescanning already-indexed text
//! - **Fail-open matching**: malformed or empty patterns match everything
//!   instead of clearing the view
//! - **Pluggable line parsers**: timestamp extraction and configurable
//!   tracker rule sets with memoized results
//! - **Decoupled command protocol**: a tokio worker processes correlated
//!   commands one at a time; a caller-side proxy handles readiness gating,
//!   correlation, and timeouts
//!
//! ## Architecture
//!
//! The library is organized into focused modules:
//!
//! - [`error`] - Centralized error types and handling
//! - [`pattern`] - Filter/request patterns and their identity keys
//! - [`matcher`] - Matching strategies and the compiled-pattern cache
//! - [`parsers`] - Auxiliary per-line parsers
//! - [`stream`] - Fragment reading, offset indexing, session state, worker
//! - [`protocol`] - Command/response definitions for the worker boundary
//! - [`client`] - Caller-side proxy with correlation and readiness gating

// Core modules
pub mod config;
pub mod error;
pub mod pattern;
pub mod row;

// Matching and parsing
pub mod matcher;
pub mod parsers;

// Session state and worker boundary
pub mod client;
pub mod protocol;
pub mod stream;

// Re-export commonly used types for convenience
pub use error::{LogsieveError, Result};

// Public API surface for external usage
pub use client::SessionClient;
pub use config::{IndexEntry, ParserConfig, TrackerSet};
pub use pattern::{Pattern, PatternMode};
pub use protocol::{Command, CommandEnvelope, Response, SequenceId};
pub use row::{ParseResult, Row};
pub use stream::{session_worker_loop, Session};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
