//! Cumulative offset to row-index mapping.
//!
//! This module provides the OffsetIndex structure that maps positions in the
//! concatenated, newline-stripped source document back to the row that owns
//! them. The index is append-only and grows monotonically as fragments are
//! merged into the session.

/// Ordered mapping from cumulative end-of-line offset to row index.
///
/// Entry `r` holds the byte offset one past the end of row `r` within the
/// concatenated source. Keys are strictly increasing because the fragment
/// reader never emits zero-length rows.
#[derive(Debug, Default, Clone)]
pub struct OffsetIndex {
    /// Cumulative end offsets, one per row.
    ///
    /// - ends[0] = length of row 0
    /// - ends[r] = ends[r-1] + length of row r
    ///
    /// Grows monotonically as more rows are indexed.
    ends: Vec<usize>,
}

impl OffsetIndex {
    /// Create a new empty offset index
    pub fn new() -> Self {
        Self { ends: Vec::new() }
    }

    /// Record the next row's cumulative end offset.
    ///
    /// `end` must be strictly greater than the last recorded offset; the
    /// fragment reader guarantees this by skipping empty lines.
    pub fn push(&mut self, end: usize) {
        debug_assert!(
            self.ends.last().map_or(true, |&last| end > last),
            "offset index keys must be strictly increasing"
        );
        self.ends.push(end);
    }

    /// Resolve an absolute document position to its owning row.
    ///
    /// Returns the row of the first recorded offset `>= position` together
    /// with that offset, or `None` when the position lies past the last
    /// indexed offset.
    pub fn resolve(&self, position: usize) -> Option<(usize, usize)> {
        let row = self.ends.partition_point(|&end| end < position);
        self.ends.get(row).map(|&end| (row, end))
    }

    /// Merge another index produced for a fresh fragment, shifting every key
    /// by `offset` (the current source length). Row indices shift implicitly:
    /// the merged entries continue this index's row numbering.
    pub fn extend_rebased(&mut self, other: &OffsetIndex, offset: usize) {
        self.ends.reserve(other.ends.len());
        for &end in &other.ends {
            self.push(end + offset);
        }
    }

    /// Number of rows indexed so far.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Total length of the indexed source (the last recorded offset).
    pub fn total_len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    /// The recorded end offsets, for consistency checks.
    pub fn ends(&self) -> &[usize] {
        &self.ends
    }
}
