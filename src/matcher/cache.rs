//! Compiled-pattern cache with incremental document scanning.
//!
//! Regex patterns are expensive to evaluate per line, so the engine scans the
//! whole concatenated document once per pattern and caches the set of matching
//! rows. Because the document is append-only, a cached scan is extended by
//! scanning only the new suffix; previously found matches are never
//! invalidated.

use std::collections::{HashMap, HashSet};

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::pattern::sanitize_regex_source;
use crate::stream::OffsetIndex;

/// One cached pattern: compiled form, matching rows, and the explicit scan
/// cursor advanced only by the suffix-append path.
#[derive(Debug)]
struct CacheEntry {
    /// `None` is the terminal fail-open sentinel: the pattern was empty or did
    /// not compile, and is treated as matching every row. Never retried.
    regex: Option<Regex>,

    /// Rows with at least one match, accumulated across suffix scans.
    matching_lines: HashSet<usize>,

    /// Byte offset of the source prefix already scanned.
    scanned_up_to: usize,
}

impl CacheEntry {
    fn compile(source: &str) -> Self {
        let sanitized = sanitize_regex_source(source);
        let regex = if sanitized.is_empty() {
            None
        } else {
            match RegexBuilder::new(sanitized).case_insensitive(true).build() {
                Ok(regex) => Some(regex),
                Err(err) => {
                    debug!("pattern {source:?} failed to compile, caching fail-open: {err}");
                    None
                }
            }
        };
        Self {
            regex,
            matching_lines: HashSet::new(),
            scanned_up_to: 0,
        }
    }

    /// Scan `source[scanned_up_to..]` and merge new hits.
    fn extend_scan(&mut self, source: &str, index: &OffsetIndex) {
        let regex = match &self.regex {
            Some(regex) => regex,
            None => return,
        };

        let mut pos = self.scanned_up_to;
        while pos <= source.len() {
            let found = match regex.find_at(source, pos) {
                Some(found) => found,
                None => break,
            };

            let mut next = found.end();
            if let Some((row, line_end)) = index.resolve(found.start()) {
                self.matching_lines.insert(row);
                // One hit marks the whole row; jump to its end offset.
                next = next.max(line_end);
            }
            if next <= found.start() {
                // Zero-width match; force the cursor past the match start.
                next = found.start()
                    + source[found.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
            }
            pos = next;
        }
        self.scanned_up_to = source.len();
    }
}

/// Session-lifetime cache of compiled regex patterns and their matching rows.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: HashMap<String, CacheEntry>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Whether `row` matches the regex pattern, scanning any unscanned suffix
    /// of `source` first. Fail-open entries match every row.
    pub fn matches(&mut self, source: &str, index: &OffsetIndex, pattern: &str, row: usize) -> bool {
        let entry = self
            .entries
            .entry(pattern.to_string())
            .or_insert_with(|| CacheEntry::compile(pattern));

        if entry.regex.is_none() {
            return true;
        }
        if entry.scanned_up_to < source.len() {
            entry.extend_scan(source, index);
        }
        entry.matching_lines.contains(&row)
    }

    /// The cached matching-row set for a pattern, scanning first if needed.
    /// `None` means the pattern is fail-open (empty or uncompilable).
    pub fn matching_lines(
        &mut self,
        source: &str,
        index: &OffsetIndex,
        pattern: &str,
    ) -> Option<&HashSet<usize>> {
        let entry = self
            .entries
            .entry(pattern.to_string())
            .or_insert_with(|| CacheEntry::compile(pattern));

        entry.regex.as_ref()?;
        if entry.scanned_up_to < source.len() {
            entry.extend_scan(source, index);
        }
        Some(&entry.matching_lines)
    }

    /// Number of cached patterns (fail-open sentinels included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
