//! Protocol definitions shared between the session worker and its caller.

use crate::pattern::Pattern;
use crate::row::Row;

/// Identifier attached to cross-task requests so responses can be correlated.
pub type SequenceId = u64;

/// One command plus its correlation envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    pub sequence_id: SequenceId,
    /// When set, the worker brackets the operation with `Started`/`Finished`
    /// progress signals (used for busy indication).
    pub progress: bool,
    pub command: Command,
}

/// Commands sent from the caller to the session worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the document with this fragment.
    Create { text: String },
    /// Ingest the next fragment (held `rest` is prepended by the session).
    Append { text: String },
    /// Register a secondary filter and re-evaluate the stored set.
    AddFilter { pattern: Pattern },
    /// Drop a secondary filter by its identity key.
    RemoveFilter { guid: String },
    /// Track a request (annotation-only) pattern.
    AddRequest { pattern: Pattern },
    /// Replace the active primary filter.
    SetActiveFilter { pattern: Pattern },
    /// Re-run the auxiliary parsers over every row.
    RecomputeParsers,
    Shutdown,
}

/// Responses emitted by the session worker back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Emitted once at worker startup; requests before this are premature.
    Ready,
    Started {
        sequence_id: SequenceId,
    },
    Finished {
        sequence_id: SequenceId,
    },
    /// The affected row set (full set for most commands).
    Rows {
        sequence_id: SequenceId,
        rows: Vec<Row>,
    },
    /// Only the rows produced by an `Append`.
    Appended {
        sequence_id: SequenceId,
        new_rows: Vec<Row>,
    },
}

impl Response {
    /// The correlation id this response answers, if it answers one.
    pub fn sequence_id(&self) -> Option<SequenceId> {
        match self {
            Response::Ready => None,
            Response::Started { sequence_id }
            | Response::Finished { sequence_id }
            | Response::Rows { sequence_id, .. }
            | Response::Appended { sequence_id, .. } => Some(*sequence_id),
        }
    }
}
