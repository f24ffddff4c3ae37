//! Parser configuration types.
//!
//! Configuration is an explicit value handed to [`Session::new`](crate::Session::new)
//! and threaded through to the parsers — never ambient global state. The CLI host
//! deserializes it from TOML; library callers can build it directly.

use std::collections::HashMap;

use serde::Deserialize;

/// One `{value, index, label}` entry of a tracker set's index table.
///
/// `value` is the hook the parser looks for (an exact cleaned value in segment
/// mode, a substring in key mode); `index`/`label` are what a hit reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexEntry {
    pub value: String,
    pub index: u32,
    pub label: String,
}

/// A named tracker rule set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TrackerSet {
    /// Multi-stage extraction: `segments` patterns cut the line into segments,
    /// `values` patterns pull values out of each segment, `clearing` patterns
    /// strip noise from each value, and the cleaned value resolves through the
    /// index table by exact match.
    Segment {
        name: String,
        segments: Vec<String>,
        values: Vec<String>,
        #[serde(default)]
        clearing: Vec<String>,
        indexes: Vec<IndexEntry>,
    },
    /// Relevance-gated substring scan: if any `tests` pattern matches the line,
    /// every index entry whose `value` occurs in the line is reported.
    Keys {
        name: String,
        tests: Vec<String>,
        indexes: Vec<IndexEntry>,
    },
}

impl TrackerSet {
    pub fn name(&self) -> &str {
        match self {
            TrackerSet::Segment { name, .. } => name,
            TrackerSet::Keys { name, .. } => name,
        }
    }
}

/// Complete parser configuration for one session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParserConfig {
    /// Tracker rule sets, keyed by set id. The id doubles as the parser id
    /// under which hits appear in a row's `parsed` map.
    #[serde(default)]
    pub tracker_sets: HashMap<String, TrackerSet>,
}

impl ParserConfig {
    pub fn is_empty(&self) -> bool {
        self.tracker_sets.is_empty()
    }
}
