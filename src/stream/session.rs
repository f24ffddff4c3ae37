//! The long-lived session: all ingested rows, the cumulative offset index, and
//! the active pattern registries.
//!
//! One session owns its state exclusively; the worker drives it one command at
//! a time, so no interior locking is needed. Rows are append-only — `text` is
//! fixed once a row exists, and every operation below only recomputes derived
//! fields in place.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use super::fragment::read_fragment;
use super::offset_index::OffsetIndex;
use crate::config::ParserConfig;
use crate::error::Result;
use crate::matcher::{MatchEngine, PatternCache};
use crate::parsers::Parsers;
use crate::pattern::{Pattern, PatternMode};
use crate::row::Row;

/// Append-only stream state plus the pattern/parse caches that serve it.
#[derive(Debug)]
pub struct Session {
    rows: Vec<Row>,
    /// All ingested text with terminators stripped; `rest` is not part of it.
    source: String,
    /// Unterminated trailing fragment awaiting completion.
    rest: String,
    index: OffsetIndex,
    active_filter: Pattern,
    filters: HashMap<String, Pattern>,
    requests: HashMap<String, Pattern>,
    cache: PatternCache,
    parsers: Parsers,
}

impl Session {
    /// Build a session with an explicit parser configuration.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            rows: Vec::new(),
            source: String::new(),
            rest: String::new(),
            index: OffsetIndex::new(),
            active_filter: Pattern::empty(),
            filters: HashMap::new(),
            requests: HashMap::new(),
            cache: PatternCache::new(),
            parsers: Parsers::new(config)?,
        })
    }

    /// Replace the document with `fragment`. Filters and requests survive a
    /// `create`; the pattern cache does not, since its scans refer to the
    /// discarded document. Returns the full row set.
    pub fn create(&mut self, fragment: &str) -> &[Row] {
        let started = Instant::now();
        self.rows.clear();
        self.source.clear();
        self.rest.clear();
        self.index = OffsetIndex::new();
        self.cache = PatternCache::new();

        self.ingest(fragment);
        debug!(
            "session create: {} rows, rest {} bytes, {:?}",
            self.rows.len(),
            self.rest.len(),
            started.elapsed()
        );
        &self.rows
    }

    /// Ingest the next fragment, prepending the held `rest`. Returns only the
    /// newly produced rows.
    pub fn append(&mut self, fragment: &str) -> &[Row] {
        let started = Instant::now();
        let from = self.rows.len();

        if self.rest.is_empty() {
            self.ingest(fragment);
        } else {
            let mut combined = std::mem::take(&mut self.rest);
            combined.push_str(fragment);
            self.ingest(&combined);
        }

        debug!(
            "session append: {} new rows, rest {} bytes, {:?}",
            self.rows.len() - from,
            self.rest.len(),
            started.elapsed()
        );
        &self.rows[from..]
    }

    /// Register a secondary filter. Returns false (and does nothing) when a
    /// filter with the same identity already exists. Does not re-evaluate;
    /// the caller follows up with [`Session::recompute_secondary_filters`].
    pub fn add_filter(&mut self, mode: PatternMode, value: impl Into<String>) -> bool {
        let pattern = Pattern::new(mode, value);
        let guid = pattern.guid();
        if self.filters.contains_key(&guid) {
            return false;
        }
        self.filters.insert(guid, pattern);
        true
    }

    /// Drop a secondary filter by identity. Returns false when absent.
    pub fn remove_filter(&mut self, guid: &str) -> bool {
        self.filters.remove(guid).is_some()
    }

    /// Re-run every stored secondary filter against every row, rebuilding each
    /// row's per-filter verdict map in place.
    pub fn recompute_secondary_filters(&mut self) {
        let Session {
            rows,
            source,
            index,
            cache,
            filters,
            ..
        } = self;
        let mut engine = MatchEngine::new(source, index, cache);

        for (row_index, row) in rows.iter_mut().enumerate() {
            row.filters.clear();
            for (guid, filter) in filters.iter() {
                row.filters
                    .insert(guid.clone(), engine.matches(filter, row_index, &row.text));
            }
        }
    }

    /// Replace the active filter and re-evaluate every row against it.
    pub fn set_active_filter(&mut self, pattern: Pattern) {
        let started = Instant::now();
        self.active_filter = pattern;
        self.evaluate_rows(0);
        debug!(
            "session active filter {:?}: {} rows, {:?}",
            self.active_filter.value,
            self.rows.len(),
            started.elapsed()
        );
    }

    /// Track a request pattern and evaluate it against every row. Empty and
    /// already-tracked patterns are no-ops. Missing verdicts for previously
    /// stored requests are back-filled while we are at it.
    pub fn add_request(&mut self, pattern: Pattern) {
        if pattern.is_empty() {
            return;
        }
        let guid = pattern.guid();
        if self.requests.contains_key(&guid) {
            return;
        }
        self.requests.insert(guid, pattern);

        let Session {
            rows,
            source,
            index,
            cache,
            requests,
            ..
        } = self;
        let mut engine = MatchEngine::new(source, index, cache);

        for (row_index, row) in rows.iter_mut().enumerate() {
            for (guid, request) in requests.iter() {
                if !row.requests.contains_key(guid) {
                    row.requests
                        .insert(guid.clone(), engine.matches(request, row_index, &row.text));
                }
            }
        }
    }

    /// Re-run all auxiliary parsers against every row's text, replacing the
    /// `parsed` maps. Used after a parser configuration change.
    pub fn recompute_parsers(&mut self) {
        let started = Instant::now();
        let Session { rows, parsers, .. } = self;
        for row in rows.iter_mut() {
            row.parsed = parsers.parse(&row.text);
        }
        debug!(
            "session parsers recomputed over {} rows, {:?}",
            self.rows.len(),
            started.elapsed()
        );
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rest(&self) -> &str {
        &self.rest
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn offset_index(&self) -> &OffsetIndex {
        &self.index
    }

    pub fn active_filter(&self) -> &Pattern {
        &self.active_filter
    }

    pub fn has_filter(&self, guid: &str) -> bool {
        self.filters.contains_key(guid)
    }

    /// Read a fragment, merge it (rebasing offsets and row numbering), and
    /// evaluate the new rows against the active pattern set.
    fn ingest(&mut self, fragment: &str) {
        let outcome = read_fragment(fragment, &mut self.parsers);
        let from = self.rows.len();

        self.index.extend_rebased(&outcome.index, self.source.len());
        self.source.push_str(&outcome.normalized);
        self.rest = outcome.rest;
        self.rows.extend(outcome.rows);

        self.evaluate_rows(from);
    }

    /// Populate derived match state for `rows[from..]`: the active filter
    /// verdict and highlight value, the per-secondary-filter map, and any
    /// missing request verdicts. The active filter's own verdict doubles as
    /// its request entry so recent searches stay annotated.
    fn evaluate_rows(&mut self, from: usize) {
        let Session {
            rows,
            source,
            index,
            cache,
            active_filter,
            filters,
            requests,
            ..
        } = self;
        let mut engine = MatchEngine::new(source, index, cache);

        let match_value = active_filter.match_value();
        let match_is_regex = active_filter.mode == PatternMode::Regex;
        let active_guid = active_filter.guid();

        for (row_index, row) in rows.iter_mut().enumerate().skip(from) {
            row.filtered = engine.matches(active_filter, row_index, &row.text);
            row.match_value = match_value.clone();
            row.match_is_regex = match_is_regex;

            row.filters.clear();
            for (guid, filter) in filters.iter() {
                row.filters
                    .insert(guid.clone(), engine.matches(filter, row_index, &row.text));
            }

            if !active_filter.is_empty() {
                row.requests.entry(active_guid.clone()).or_insert(row.filtered);
            }
            for (guid, request) in requests.iter() {
                if !row.requests.contains_key(guid) {
                    row.requests
                        .insert(guid.clone(), engine.matches(request, row_index, &row.text));
                }
            }
        }
    }
}
