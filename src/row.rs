//! Row records — the line-granular unit of an ingested stream.

use std::collections::HashMap;

use chrono::NaiveDateTime;

/// One extracted timestamp occurrence on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampHit {
    pub datetime: NaiveDateTime,
    pub epoch_millis: i64,
}

/// One tracker index hit on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerHit {
    pub index: u32,
    pub label: String,
}

/// Output of one auxiliary parser for one line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Timestamps(Vec<TimestampHit>),
    Tracker(Vec<TrackerHit>),
}

/// One logical line of the stream.
///
/// `text` is fixed at construction and never changes afterwards; every other
/// field is derived state, recomputed in place when patterns or parser
/// configuration change.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Raw line content, terminators stripped.
    pub text: String,

    /// Output of each auxiliary parser, keyed by parser id. Parsers that
    /// produced no hits leave no entry.
    pub parsed: HashMap<String, ParseResult>,

    /// Whether the row passes the currently active primary filter.
    pub filtered: bool,

    /// Cleaned literal of the active filter, for highlight rendering.
    pub match_value: String,

    pub match_is_regex: bool,

    /// Per-secondary-filter verdicts, keyed by pattern GUID.
    pub filters: HashMap<String, bool>,

    /// Per-request verdicts, keyed by pattern GUID.
    pub requests: HashMap<String, bool>,
}

impl Row {
    /// A fresh row for a newly split line; derived fields start permissive and
    /// are populated by the session's evaluation pass.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parsed: HashMap::new(),
            filtered: true,
            match_value: String::new(),
            match_is_regex: false,
            filters: HashMap::new(),
            requests: HashMap::new(),
        }
    }
}
