//! Fragment reading.
//!
//! A fragment is a chunk of raw text that is not necessarily line-aligned. The
//! reader splits it on `\n`/`\r\n`/`\r`, withholds a trailing unterminated line
//! as `rest`, and builds the per-fragment offset index over the retained lines.
//! Empty candidate lines are discarded, which is what keeps the offset index
//! keys strictly increasing.

use memchr::memchr2;

use super::offset_index::OffsetIndex;
use crate::parsers::Parsers;
use crate::row::Row;

/// Result of reading one fragment.
#[derive(Debug)]
pub struct FragmentOutcome {
    /// Rows for every retained line, parsed but not yet matched.
    pub rows: Vec<Row>,
    /// Fragment-local offset index over `normalized`.
    pub index: OffsetIndex,
    /// Trailing unterminated line withheld for the next fragment.
    pub rest: String,
    /// Retained lines concatenated without terminators; length-consistent
    /// with `index`. `rest` is never part of it.
    pub normalized: String,
}

impl FragmentOutcome {
    fn empty_with_rest(rest: String) -> Self {
        Self {
            rows: Vec::new(),
            index: OffsetIndex::new(),
            rest,
            normalized: String::new(),
        }
    }
}

/// Split `fragment` into rows, run the auxiliary parsers on each line, and
/// index the cumulative line-end offsets.
pub fn read_fragment(fragment: &str, parsers: &mut Parsers) -> FragmentOutcome {
    let mut lines = split_lines(fragment);

    let mut rest = String::new();
    if !ends_with_terminator(fragment) {
        if let Some(broken) = lines.pop() {
            rest = broken.to_string();
        }
    }

    if lines.is_empty() {
        return FragmentOutcome::empty_with_rest(rest);
    }

    let mut index = OffsetIndex::new();
    let mut normalized = String::with_capacity(fragment.len());
    let mut rows = Vec::with_capacity(lines.len());
    let mut total_len = 0;

    for line in lines {
        total_len += line.len();
        index.push(total_len);
        normalized.push_str(line);

        let mut row = Row::new(line);
        row.parsed = parsers.parse(line);
        rows.push(row);
    }

    FragmentOutcome {
        rows,
        index,
        rest,
        normalized,
    }
}

/// Non-empty runs between line terminators, in order.
fn split_lines(fragment: &str) -> Vec<&str> {
    let bytes = fragment.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    while start < bytes.len() {
        match memchr2(b'\n', b'\r', &bytes[start..]) {
            Some(offset) => {
                if offset > 0 {
                    lines.push(&fragment[start..start + offset]);
                }
                start += offset + 1;
            }
            None => {
                lines.push(&fragment[start..]);
                break;
            }
        }
    }

    lines
}

fn ends_with_terminator(fragment: &str) -> bool {
    matches!(fragment.as_bytes().last(), Some(b'\n') | Some(b'\r'))
}
