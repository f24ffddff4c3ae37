//! The session worker: one logically sequential task that owns the stream
//! state and processes commands one at a time. There is no cancellation for an
//! in-flight command; a long scan runs to completion before the next command
//! is picked up.

use tokio::sync::mpsc::{Receiver, Sender};

use super::session::Session;
use crate::protocol::{Command, CommandEnvelope, Response};

/// Run the session worker, processing commands until `Shutdown` or until
/// either channel closes. Emits `Ready` before accepting the first command.
pub async fn session_worker_loop(
    mut rx: Receiver<CommandEnvelope>,
    tx: Sender<Response>,
    session: Session,
) {
    let mut state = WorkerState::new(session);

    if tx.send(Response::Ready).await.is_err() {
        return;
    }

    while let Some(envelope) = rx.recv().await {
        let sequence_id = envelope.sequence_id;
        let progress = envelope.progress;

        if progress && tx.send(Response::Started { sequence_id }).await.is_err() {
            break;
        }

        let outcome = state.handle_command(envelope);

        if progress && tx.send(Response::Finished { sequence_id }).await.is_err() {
            break;
        }
        if let Some(response) = outcome.response {
            if tx.send(response).await.is_err() {
                break;
            }
        }

        if outcome.done {
            break;
        }
    }
}

struct WorkerState {
    session: Session,
}

impl WorkerState {
    fn new(session: Session) -> Self {
        Self { session }
    }

    fn handle_command(&mut self, envelope: CommandEnvelope) -> HandlerOutcome {
        let sequence_id = envelope.sequence_id;
        match envelope.command {
            Command::Create { text } => {
                let rows = self.session.create(&text).to_vec();
                HandlerOutcome::respond(Response::Rows { sequence_id, rows })
            }
            Command::Append { text } => {
                let new_rows = self.session.append(&text).to_vec();
                HandlerOutcome::respond(Response::Appended {
                    sequence_id,
                    new_rows,
                })
            }
            Command::AddFilter { pattern } => {
                if self.session.add_filter(pattern.mode, pattern.value) {
                    self.session.recompute_secondary_filters();
                    HandlerOutcome::respond(Response::Rows {
                        sequence_id,
                        rows: self.session.rows().to_vec(),
                    })
                } else {
                    // Duplicate identity; no-op commands emit nothing.
                    HandlerOutcome::continue_without_response()
                }
            }
            Command::RemoveFilter { guid } => {
                if self.session.remove_filter(&guid) {
                    self.session.recompute_secondary_filters();
                    HandlerOutcome::respond(Response::Rows {
                        sequence_id,
                        rows: self.session.rows().to_vec(),
                    })
                } else {
                    HandlerOutcome::continue_without_response()
                }
            }
            Command::AddRequest { pattern } => {
                self.session.add_request(pattern);
                HandlerOutcome::respond(Response::Rows {
                    sequence_id,
                    rows: self.session.rows().to_vec(),
                })
            }
            Command::SetActiveFilter { pattern } => {
                self.session.set_active_filter(pattern);
                HandlerOutcome::respond(Response::Rows {
                    sequence_id,
                    rows: self.session.rows().to_vec(),
                })
            }
            Command::RecomputeParsers => {
                self.session.recompute_parsers();
                HandlerOutcome::respond(Response::Rows {
                    sequence_id,
                    rows: self.session.rows().to_vec(),
                })
            }
            Command::Shutdown => HandlerOutcome::exit(),
        }
    }
}

struct HandlerOutcome {
    response: Option<Response>,
    done: bool,
}

impl HandlerOutcome {
    fn respond(response: Response) -> Self {
        Self {
            response: Some(response),
            done: false,
        }
    }

    fn continue_without_response() -> Self {
        Self {
            response: None,
            done: false,
        }
    }

    fn exit() -> Self {
        Self {
            response: None,
            done: true,
        }
    }
}
