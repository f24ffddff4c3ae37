//! logsieve - Incremental log-stream filtering from the command line.
//!
//! Reads a log file in fixed-size chunks and feeds them to the engine the way
//! a live stream source would, then prints the rows that pass the filter. The
//! engine itself does no I/O; this binary is the data source collaborator.

use anyhow::Result;
use clap::{Arg, ArgAction, Command as Cli};
use std::path::PathBuf;
use std::time::Duration;

use logsieve::{Command, ParserConfig, Pattern, PatternMode, Response, Session, SessionClient};

const REQUEST_DEADLINE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging for development
    env_logger::init();

    let matches = Cli::new("logsieve")
        .version(logsieve::VERSION)
        .about("Filter a log file through the logsieve engine")
        .arg(
            Arg::new("file")
                .help("Path to the log file to ingest")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .short('f')
                .help("Active filter pattern; only matching rows are printed"),
        )
        .arg(
            Arg::new("regex")
                .long("regex")
                .short('r')
                .action(ArgAction::SetTrue)
                .help("Treat the filter as a regular expression"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_parser(clap::value_parser!(usize))
                .default_value("65536")
                .help("Fragment size in bytes fed to the engine per append"),
        )
        .arg(
            Arg::new("parsers")
                .long("parsers")
                .help("TOML file with tracker rule sets"),
        )
        .get_matches();

    let file_path = PathBuf::from(
        matches
            .get_one::<String>("file")
            .expect("file argument is required"),
    );

    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", file_path.display());
    }
    if !file_path.is_file() {
        anyhow::bail!("Path is not a regular file: {}", file_path.display());
    }

    let config = match matches.get_one::<String>("parsers") {
        Some(path) => toml::from_str::<ParserConfig>(&std::fs::read_to_string(path)?)?,
        None => ParserConfig::default(),
    };

    let chunk_size = *matches
        .get_one::<usize>("chunk-size")
        .expect("chunk-size has a default");
    if chunk_size == 0 {
        anyhow::bail!("chunk-size must be at least 1 byte");
    }

    let session = Session::new(&config)?;
    let (client, worker) = SessionClient::spawn(session);
    client.wait_until_ready(Duration::from_secs(5)).await?;

    if let Some(value) = matches.get_one::<String>("filter") {
        let mode = if matches.get_flag("regex") {
            PatternMode::Regex
        } else {
            PatternMode::Text
        };
        client
            .request(
                Command::SetActiveFilter {
                    pattern: Pattern::new(mode, value.clone()),
                },
                REQUEST_DEADLINE,
            )
            .await?;
    }

    let contents = std::fs::read_to_string(&file_path)?;
    let mut chunks = chunk_at_char_boundaries(&contents, chunk_size).into_iter();

    let mut total = 0usize;
    let mut matched = 0usize;

    let first = chunks.next().unwrap_or("").to_string();
    let response = client
        .request(Command::Create { text: first }, REQUEST_DEADLINE)
        .await?;
    if let Response::Rows { rows, .. } = response {
        print_rows(&rows, &mut total, &mut matched);
    }

    for chunk in chunks {
        let response = client
            .request(
                Command::Append {
                    text: chunk.to_string(),
                },
                REQUEST_DEADLINE,
            )
            .await?;
        if let Response::Appended { new_rows, .. } = response {
            print_rows(&new_rows, &mut total, &mut matched);
        }
    }

    // Flush a trailing unterminated line, if the file has one.
    if !contents.is_empty() && !contents.ends_with(['\n', '\r']) {
        let response = client
            .request(
                Command::Append {
                    text: "\n".to_string(),
                },
                REQUEST_DEADLINE,
            )
            .await?;
        if let Response::Appended { new_rows, .. } = response {
            print_rows(&new_rows, &mut total, &mut matched);
        }
    }

    eprintln!("{matched} of {total} rows matched");

    client.shutdown().await?;
    worker.await?;

    Ok(())
}

fn print_rows(rows: &[logsieve::Row], total: &mut usize, matched: &mut usize) {
    for row in rows {
        *total += 1;
        if row.filtered {
            *matched += 1;
            println!("{}", row.text);
        }
    }
}

/// Split `text` into chunks of roughly `size` bytes, never inside a UTF-8
/// character.
fn chunk_at_char_boundaries(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // Chunk smaller than one character; take the whole character.
            end = start
                + text[start..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
        chunks.push(&text[start..end]);
        start = end;
    }
    chunks
}
