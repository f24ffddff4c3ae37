use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use logsieve::config::ParserConfig;
use logsieve::protocol::{Command, CommandEnvelope, Response};
use logsieve::stream::{session_worker_loop, Session};
use logsieve::{LogsieveError, Pattern, PatternMode, SessionClient};

const TIMEOUT_MS: u64 = 500;

async fn next_response(rx: &mut mpsc::Receiver<Response>) -> Response {
    timeout(Duration::from_millis(TIMEOUT_MS), rx.recv())
        .await
        .expect("worker response timed out")
        .expect("worker channel closed unexpectedly")
}

async fn spawn_worker() -> (
    mpsc::Sender<CommandEnvelope>,
    mpsc::Receiver<Response>,
    tokio::task::JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (resp_tx, mut resp_rx) = mpsc::channel(8);

    let session = Session::new(&ParserConfig::default()).expect("default config");
    let worker = tokio::spawn(session_worker_loop(cmd_rx, resp_tx, session));

    // Consume the startup signal so tests only see command responses.
    match next_response(&mut resp_rx).await {
        Response::Ready => {}
        other => panic!("expected Ready before any command, got {other:?}"),
    }

    (cmd_tx, resp_rx, worker)
}

fn envelope(sequence_id: u64, command: Command) -> CommandEnvelope {
    CommandEnvelope {
        sequence_id,
        progress: false,
        command,
    }
}

fn texts(rows: &[logsieve::Row]) -> Vec<&str> {
    rows.iter().map(|row| row.text.as_str()).collect()
}

#[tokio::test]
async fn create_then_append_settles_broken_line() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker().await;

    cmd_tx
        .send(envelope(
            1,
            Command::Create {
                text: "ERROR a\nINFO b\nWARN c".to_string(),
            },
        ))
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        Response::Rows { sequence_id, rows } => {
            assert_eq!(sequence_id, 1);
            assert_eq!(texts(&rows), vec!["ERROR a", "INFO b"]);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx
        .send(envelope(
            2,
            Command::Append {
                text: " end\n".to_string(),
            },
        ))
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        Response::Appended {
            sequence_id,
            new_rows,
        } => {
            assert_eq!(sequence_id, 2);
            assert_eq!(texts(&new_rows), vec!["WARN c end"]);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(envelope(3, Command::Shutdown)).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn progress_signals_bracket_the_result() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker().await;

    cmd_tx
        .send(CommandEnvelope {
            sequence_id: 9,
            progress: true,
            command: Command::Create {
                text: "one\ntwo\n".to_string(),
            },
        })
        .await
        .unwrap();

    assert_eq!(
        next_response(&mut resp_rx).await,
        Response::Started { sequence_id: 9 }
    );
    assert_eq!(
        next_response(&mut resp_rx).await,
        Response::Finished { sequence_id: 9 }
    );
    match next_response(&mut resp_rx).await {
        Response::Rows { sequence_id, rows } => {
            assert_eq!(sequence_id, 9);
            assert_eq!(rows.len(), 2);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(envelope(10, Command::Shutdown)).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn set_active_filter_reevaluates_all_rows() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker().await;

    cmd_tx
        .send(envelope(
            1,
            Command::Create {
                text: "ERROR a\nINFO b\n".to_string(),
            },
        ))
        .await
        .unwrap();
    next_response(&mut resp_rx).await;

    cmd_tx
        .send(envelope(
            2,
            Command::SetActiveFilter {
                pattern: Pattern::new(PatternMode::Text, "ERROR"),
            },
        ))
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        Response::Rows { rows, .. } => {
            let flags: Vec<bool> = rows.iter().map(|row| row.filtered).collect();
            assert_eq!(flags, vec![true, false]);
            assert_eq!(rows[0].match_value, "ERROR");
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(envelope(3, Command::Shutdown)).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn regex_filter_matches_expected_line_set() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker().await;

    cmd_tx
        .send(envelope(
            1,
            Command::Create {
                text: "a1\nb\nc22\n".to_string(),
            },
        ))
        .await
        .unwrap();
    next_response(&mut resp_rx).await;

    cmd_tx
        .send(envelope(
            2,
            Command::SetActiveFilter {
                pattern: Pattern::new(PatternMode::Regex, r"\d+"),
            },
        ))
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        Response::Rows { rows, .. } => {
            let matching: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.filtered)
                .map(|(index, _)| index)
                .collect();
            assert_eq!(matching, vec![0, 2]);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(envelope(3, Command::Shutdown)).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn noop_filter_commands_emit_nothing() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker().await;

    cmd_tx
        .send(envelope(
            1,
            Command::AddFilter {
                pattern: Pattern::new(PatternMode::Text, "ERROR"),
            },
        ))
        .await
        .unwrap();
    match next_response(&mut resp_rx).await {
        Response::Rows { sequence_id, .. } => assert_eq!(sequence_id, 1),
        other => panic!("unexpected response: {other:?}"),
    }

    // Duplicate identity: ignored, no response carries sequence 2.
    cmd_tx
        .send(envelope(
            2,
            Command::AddFilter {
                pattern: Pattern::new(PatternMode::Text, "ERROR"),
            },
        ))
        .await
        .unwrap();

    // Unknown guid: ignored as well.
    cmd_tx
        .send(envelope(
            3,
            Command::RemoveFilter {
                guid: "textNOPE".to_string(),
            },
        ))
        .await
        .unwrap();

    cmd_tx
        .send(envelope(4, Command::RecomputeParsers))
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        Response::Rows { sequence_id, .. } => assert_eq!(sequence_id, 4),
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(envelope(5, Command::Shutdown)).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn add_request_annotates_without_hiding() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker().await;

    cmd_tx
        .send(envelope(
            1,
            Command::Create {
                text: "ERROR a\nINFO b\n".to_string(),
            },
        ))
        .await
        .unwrap();
    next_response(&mut resp_rx).await;

    cmd_tx
        .send(envelope(
            2,
            Command::AddRequest {
                pattern: Pattern::new(PatternMode::Text, "INFO"),
            },
        ))
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        Response::Rows { rows, .. } => {
            assert!(rows.iter().all(|row| row.filtered));
            assert_eq!(rows[0].requests.get("textINFO"), Some(&false));
            assert_eq!(rows[1].requests.get("textINFO"), Some(&true));
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(envelope(3, Command::Shutdown)).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn client_round_trip_over_spawned_worker() {
    let session = Session::new(&ParserConfig::default()).expect("default config");
    let (client, worker) = SessionClient::spawn(session);

    client
        .wait_until_ready(Duration::from_millis(TIMEOUT_MS))
        .await
        .expect("worker becomes ready");

    let response = client
        .request(
            Command::Create {
                text: "alpha\nbeta\n".to_string(),
            },
            Duration::from_millis(TIMEOUT_MS),
        )
        .await
        .expect("create succeeds");

    match response {
        Response::Rows { rows, .. } => assert_eq!(texts(&rows), vec!["alpha", "beta"]),
        other => panic!("unexpected response: {other:?}"),
    }
    assert_eq!(client.outstanding(), 0);

    client.shutdown().await.expect("shutdown dispatches");
    worker.await.unwrap();
}

#[tokio::test]
async fn client_rejects_requests_before_ready() {
    // No worker attached: the response channel stays silent, so the proxy
    // never observes Ready.
    let (cmd_tx, _cmd_rx) = mpsc::channel(8);
    let (_resp_tx, resp_rx) = mpsc::channel(8);
    let client = SessionClient::new(cmd_tx, resp_rx);

    let result = client
        .request(Command::RecomputeParsers, Duration::from_millis(50))
        .await;
    assert!(matches!(result, Err(LogsieveError::NotReady)));
    assert_eq!(client.outstanding(), 0);
}

#[tokio::test]
async fn client_timeout_abandons_the_correlation() {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<CommandEnvelope>(8);
    let (resp_tx, resp_rx) = mpsc::channel(8);
    let client = SessionClient::new(cmd_tx, resp_rx);

    resp_tx.send(Response::Ready).await.unwrap();
    client
        .wait_until_ready(Duration::from_millis(TIMEOUT_MS))
        .await
        .expect("ready signal routed");

    let result = client
        .request(Command::RecomputeParsers, Duration::from_millis(50))
        .await;
    let sequence_id = match result {
        Err(LogsieveError::Timeout { sequence_id }) => sequence_id,
        other => panic!("expected timeout, got {other:?}"),
    };
    assert_eq!(client.outstanding(), 0);

    // The command reached the worker side even though the caller gave up.
    let envelope = cmd_rx.recv().await.expect("command dispatched");
    assert_eq!(envelope.sequence_id, sequence_id);

    // A late response for the abandoned id is dropped without disturbing
    // later requests.
    resp_tx
        .send(Response::Rows {
            sequence_id,
            rows: Vec::new(),
        })
        .await
        .unwrap();

    let pending = client.request(Command::RecomputeParsers, Duration::from_millis(50));
    let _ = pending.await; // times out too; nothing answers — but must not panic
    assert_eq!(client.outstanding(), 0);
}
