//! Auxiliary per-line parsers.
//!
//! Parsers enrich rows with structured data extracted from the raw line text:
//! the timestamp parser pulls calendar timestamps, the tracker parser applies
//! user-configured rule sets. Results land in a row's `parsed` map keyed by
//! parser id; a parser with no hits on a line leaves no entry.

pub mod timestamp;
pub mod tracker;

pub use timestamp::TimestampParser;
pub use tracker::TrackerParser;

use std::collections::HashMap;

use crate::config::ParserConfig;
use crate::error::Result;
use crate::row::ParseResult;

/// Parser id of the built-in timestamp parser.
pub const TIMESTAMP_PARSER_ID: &str = "timestamp";

/// Registry of the built-in parsers, constructed once per session from an
/// explicit [`ParserConfig`].
#[derive(Debug)]
pub struct Parsers {
    timestamp: TimestampParser,
    tracker: TrackerParser,
}

impl Parsers {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            timestamp: TimestampParser::new()?,
            tracker: TrackerParser::new(config)?,
        })
    }

    /// Run every parser against one line and collect the non-empty results.
    pub fn parse(&mut self, line: &str) -> HashMap<String, ParseResult> {
        let mut parsed = HashMap::new();

        let timestamps = self.timestamp.parse(line);
        if !timestamps.is_empty() {
            parsed.insert(
                TIMESTAMP_PARSER_ID.to_string(),
                ParseResult::Timestamps(timestamps),
            );
        }

        for (set_id, hits) in self.tracker.parse(line) {
            parsed.insert(set_id, ParseResult::Tracker(hits));
        }

        parsed
    }
}
