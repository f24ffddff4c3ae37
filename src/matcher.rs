//! Pattern matching strategies.
//!
//! Two interchangeable strategies, selected per pattern by a closed dispatch on
//! [`PatternMode`]: a plain substring test for text patterns, and a cached
//! whole-document regex scan for regex patterns. Empty and uncompilable
//! patterns are fail-open in both modes — they match every row, so a malformed
//! filter never clears the view.

pub mod cache;

pub use cache::PatternCache;

use crate::pattern::{Pattern, PatternMode};
use crate::stream::OffsetIndex;

/// Borrowed view of the session document plus the pattern cache, bundled for
/// one evaluation pass.
pub struct MatchEngine<'a> {
    source: &'a str,
    index: &'a OffsetIndex,
    cache: &'a mut PatternCache,
}

impl<'a> MatchEngine<'a> {
    pub fn new(source: &'a str, index: &'a OffsetIndex, cache: &'a mut PatternCache) -> Self {
        Self {
            source,
            index,
            cache,
        }
    }

    /// Whether `row_index` (with line content `text`) matches `pattern`.
    pub fn matches(&mut self, pattern: &Pattern, row_index: usize, text: &str) -> bool {
        if pattern.value.is_empty() {
            return true;
        }
        match pattern.mode {
            PatternMode::Text => text.contains(&pattern.value),
            PatternMode::Regex => self
                .cache
                .matches(self.source, self.index, &pattern.value, row_index),
        }
    }
}
