//! Tracker rule-set parser.
//!
//! Applies the configured tracker sets to each line. Segment-mode sets run a
//! multi-stage extraction (segments, then values, then cleanup) and resolve the
//! cleaned value through an exact-match index; key-mode sets gate a substring
//! scan of the index table behind relevance test patterns. Non-empty results
//! are memoized; empty results are recomputed on every pass, which keeps
//! hot-reloaded rule sets honest at the price of repeated misses.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use regex::Regex;

use crate::config::{IndexEntry, ParserConfig, TrackerSet};
use crate::error::{LogsieveError, Result};
use crate::row::TrackerHit;

/// Memoized results kept per session; sized for a few thousand distinct lines.
const MEMO_CAPACITY: usize = 4096;

/// Separator for memo key components; never occurs in rule output.
const KEY_SEP: char = '\u{1f}';

#[derive(Debug)]
enum CompiledRules {
    Segment {
        segments: Vec<Regex>,
        values: Vec<Regex>,
        clearing: Vec<Regex>,
        indexes: HashMap<String, IndexEntry>,
    },
    Keys {
        tests: Vec<Regex>,
        indexes: Vec<IndexEntry>,
    },
}

#[derive(Debug)]
struct CompiledSet {
    id: String,
    rules: CompiledRules,
}

/// Rule-set parser with per-session memoization of non-empty results.
pub struct TrackerParser {
    sets: Vec<CompiledSet>,
    memo: LruCache<String, Vec<TrackerHit>>,
}

impl std::fmt::Debug for TrackerParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerParser")
            .field("sets", &self.sets)
            .field("memoized", &self.memo.len())
            .finish()
    }
}

impl TrackerParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let mut sets = Vec::with_capacity(config.tracker_sets.len());
        for (id, set) in &config.tracker_sets {
            sets.push(CompiledSet {
                id: id.clone(),
                rules: compile_set(id, set)?,
            });
        }
        // Deterministic evaluation order regardless of config map ordering.
        sets.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Self {
            sets,
            memo: LruCache::new(NonZeroUsize::new(MEMO_CAPACITY).expect("nonzero capacity")),
        })
    }

    /// Apply every set to `line`; returns `(set_id, hits)` for sets that hit.
    pub fn parse(&mut self, line: &str) -> Vec<(String, Vec<TrackerHit>)> {
        let memo = &mut self.memo;
        let mut results = Vec::new();

        for set in &self.sets {
            let hits = match &set.rules {
                CompiledRules::Segment {
                    segments,
                    values,
                    clearing,
                    indexes,
                } => {
                    let extracted = extract_matches(segments, line);
                    if extracted.is_empty() {
                        continue;
                    }
                    let key = memo_key(&set.id, &extracted);
                    match memo.get(&key) {
                        Some(hits) => hits.clone(),
                        None => {
                            let hits = resolve_segments(&extracted, values, clearing, indexes);
                            if !hits.is_empty() {
                                memo.put(key, hits.clone());
                            }
                            hits
                        }
                    }
                }
                CompiledRules::Keys { tests, indexes } => {
                    let key = memo_key(&set.id, &[line.to_string()]);
                    match memo.get(&key) {
                        Some(hits) => hits.clone(),
                        None => {
                            if !tests.iter().any(|test| test.is_match(line)) {
                                continue;
                            }
                            let hits: Vec<TrackerHit> = indexes
                                .iter()
                                .filter(|entry| line.contains(&entry.value))
                                .map(|entry| TrackerHit {
                                    index: entry.index,
                                    label: entry.label.clone(),
                                })
                                .collect();
                            if !hits.is_empty() {
                                memo.put(key, hits.clone());
                            }
                            hits
                        }
                    }
                }
            };

            if !hits.is_empty() {
                results.push((set.id.clone(), hits));
            }
        }

        results
    }
}

fn compile_set(id: &str, set: &TrackerSet) -> Result<CompiledRules> {
    match set {
        TrackerSet::Segment {
            segments,
            values,
            clearing,
            indexes,
            ..
        } => {
            if segments.is_empty() || values.is_empty() {
                return Err(LogsieveError::config(format!(
                    "tracker set {id:?} needs at least one segment and one value pattern"
                )));
            }
            Ok(CompiledRules::Segment {
                segments: compile_patterns(id, segments)?,
                values: compile_patterns(id, values)?,
                clearing: compile_patterns(id, clearing)?,
                indexes: indexes
                    .iter()
                    .map(|entry| (entry.value.clone(), entry.clone()))
                    .collect(),
            })
        }
        TrackerSet::Keys { tests, indexes, .. } => {
            if tests.is_empty() {
                return Err(LogsieveError::config(format!(
                    "tracker set {id:?} needs at least one test pattern"
                )));
            }
            Ok(CompiledRules::Keys {
                tests: compile_patterns(id, tests)?,
                indexes: indexes.clone(),
            })
        }
    }
}

fn compile_patterns(id: &str, sources: &[String]) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source).map_err(|err| {
                LogsieveError::config(format!("tracker set {id:?} pattern {source:?}: {err}"))
            })
        })
        .collect()
}

fn memo_key(set_id: &str, parts: &[String]) -> String {
    let mut key = String::with_capacity(set_id.len() + parts.iter().map(String::len).sum::<usize>());
    key.push_str(set_id);
    for part in parts {
        key.push(KEY_SEP);
        key.push_str(part);
    }
    key
}

/// All matches of every pattern over `line`, pattern order then occurrence order.
fn extract_matches(patterns: &[Regex], line: &str) -> Vec<String> {
    let mut out = Vec::new();
    for pattern in patterns {
        for found in pattern.find_iter(line) {
            if !found.as_str().is_empty() {
                out.push(found.as_str().to_string());
            }
        }
    }
    out
}

fn resolve_segments(
    segments: &[String],
    values: &[Regex],
    clearing: &[Regex],
    indexes: &HashMap<String, IndexEntry>,
) -> Vec<TrackerHit> {
    let mut hits = Vec::new();
    for segment in segments {
        for value in extract_matches(values, segment) {
            let mut cleaned = value;
            for pattern in clearing {
                cleaned = pattern.replace_all(&cleaned, "").into_owned();
            }
            if let Some(entry) = indexes.get(&cleaned) {
                hits.push(TrackerHit {
                    index: entry.index,
                    label: entry.label.clone(),
                });
            }
        }
    }
    hits
}
