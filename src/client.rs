//! Caller-side proxy for the session worker.
//!
//! The proxy owns correlation: it allocates monotonically increasing sequence
//! ids, parks a oneshot sender per in-flight request, and routes worker
//! responses back from a background task. Requests issued before the worker
//! signals `Ready` are rejected without reaching the engine; responses with no
//! pending correlation (for example after a caller-side timeout) are logged
//! and dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{LogsieveError, Result};
use crate::protocol::{Command, CommandEnvelope, Response, SequenceId};
use crate::stream::{session_worker_loop, Session};

type PendingMap = Arc<Mutex<HashMap<SequenceId, oneshot::Sender<Response>>>>;

/// Handle for driving one session worker over the command channel.
#[derive(Debug)]
pub struct SessionClient {
    tx: Sender<CommandEnvelope>,
    pending: PendingMap,
    ready: watch::Receiver<bool>,
    next_sequence: AtomicU64,
}

impl SessionClient {
    /// Wire a proxy onto existing channels and start the response router.
    pub fn new(tx: Sender<CommandEnvelope>, rx: Receiver<Response>) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (ready_tx, ready_rx) = watch::channel(false);
        tokio::spawn(route_responses(rx, Arc::clone(&pending), ready_tx));

        Self {
            tx,
            pending,
            ready: ready_rx,
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Spawn a worker for `session` and return the connected proxy plus the
    /// worker's join handle.
    pub fn spawn(session: Session) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (resp_tx, resp_rx) = mpsc::channel(32);
        let worker = tokio::spawn(session_worker_loop(cmd_rx, resp_tx, session));
        (Self::new(cmd_tx, resp_rx), worker)
    }

    /// Whether the worker has signalled readiness.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait for the worker's `Ready` signal.
    pub async fn wait_until_ready(&self, deadline: Duration) -> Result<()> {
        let mut ready = self.ready.clone();
        tokio::time::timeout(deadline, ready.wait_for(|ready| *ready))
            .await
            .map_err(|_| LogsieveError::NotReady)?
            .map_err(|_| LogsieveError::ChannelClosed)?;
        Ok(())
    }

    /// Number of requests still awaiting a response; drives busy indication.
    pub fn outstanding(&self) -> usize {
        self.pending.lock().len()
    }

    /// Send one command and wait for its correlated response.
    ///
    /// Timing out abandons the correlation id — the in-flight command still
    /// runs to completion on the worker, and its late response is dropped by
    /// the router.
    pub async fn request(&self, command: Command, deadline: Duration) -> Result<Response> {
        if !self.is_ready() {
            return Err(LogsieveError::NotReady);
        }

        let sequence_id = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let (response_tx, response_rx) = oneshot::channel();
        self.pending.lock().insert(sequence_id, response_tx);

        let envelope = CommandEnvelope {
            sequence_id,
            progress: false,
            command,
        };
        if self.tx.send(envelope).await.is_err() {
            self.pending.lock().remove(&sequence_id);
            return Err(LogsieveError::ChannelClosed);
        }

        match tokio::time::timeout(deadline, response_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(LogsieveError::ChannelClosed),
            Err(_) => {
                self.pending.lock().remove(&sequence_id);
                Err(LogsieveError::Timeout { sequence_id })
            }
        }
    }

    /// Ask the worker to exit its loop. No response is expected.
    pub async fn shutdown(&self) -> Result<()> {
        let sequence_id = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let envelope = CommandEnvelope {
            sequence_id,
            progress: false,
            command: Command::Shutdown,
        };
        self.tx
            .send(envelope)
            .await
            .map_err(|_| LogsieveError::ChannelClosed)
    }
}

async fn route_responses(
    mut rx: Receiver<Response>,
    pending: PendingMap,
    ready: watch::Sender<bool>,
) {
    while let Some(response) = rx.recv().await {
        match response {
            Response::Ready => {
                let _ = ready.send(true);
            }
            Response::Started { .. } | Response::Finished { .. } => {
                // Progress signals are informational; correlation stays open
                // until the result event arrives.
            }
            response @ (Response::Rows { .. } | Response::Appended { .. }) => {
                let sequence_id = match response.sequence_id() {
                    Some(sequence_id) => sequence_id,
                    None => continue,
                };
                let slot = pending.lock().remove(&sequence_id);
                match slot {
                    Some(slot) => {
                        // A failed send means the requester gave up; that is
                        // the same as an unmatched response.
                        if slot.send(response).is_err() {
                            warn!("dropping response for abandoned request {sequence_id}");
                        }
                    }
                    None => warn!("dropping unmatched response for request {sequence_id}"),
                }
            }
        }
    }
}
