//! Columnar ingestion of proxy access logs.
//!
//! A raw line is split on whitespace into the proxy's column layout:
//!
//! ```text
//! month day time hostname process_id client_ip:port accept_date frontend_name
//! server_name timers http_status_code bytes_read captured_request_cookie
//! captured_response_cookie termination_state retries connections_counts
//! request_path http_request...
//! ```
//!
//! Everything from the 19th column on is the HTTP request line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ipusage_common::network::client;
use thiserror::Error;
use tracing::{debug, warn};

use super::LogRow;
use super::filter::ContentFilter;

const MONTH: usize = 0;
const DAY: usize = 1;
const TIME: usize = 2;
const CLIENT_IP_PORT: usize = 5;
const SERVER_NAME: usize = 8;
const REQUEST_PATH: usize = 17;
const HTTP_REQUEST: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogLineError {
    #[error("expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("day '{0}' is not a number")]
    BadDay(String),
}

/// Rows read from one or more sources, with a count of lines skipped.
#[derive(Debug, Clone, Default)]
pub struct LogBatch {
    pub rows: Vec<LogRow>,
    pub skipped: usize,
}

impl LogBatch {
    pub fn extend(&mut self, other: LogBatch) {
        self.rows.extend(other.rows);
        self.skipped += other.skipped;
    }

    /// Keeps only the rows `filter` accepts.
    pub fn retain(&mut self, filter: &ContentFilter) {
        self.rows.retain(|row| filter.keeps(row));
    }
}

/// Splits one raw log line into a [`LogRow`].
pub fn parse_line(line: &str) -> Result<LogRow, LogLineError> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() <= HTTP_REQUEST {
        return Err(LogLineError::TooFewColumns {
            expected: HTTP_REQUEST + 1,
            found: columns.len(),
        });
    }

    let day = columns[DAY]
        .parse::<u32>()
        .map_err(|_| LogLineError::BadDay(columns[DAY].to_string()))?;
    let (client_ip, _port) = client::split_port(columns[CLIENT_IP_PORT]);

    Ok(LogRow {
        month: columns[MONTH].to_string(),
        day,
        time: columns[TIME].to_string(),
        client_ip: client_ip.to_string(),
        server_name: columns[SERVER_NAME].to_string(),
        request_path: columns[REQUEST_PATH].to_string(),
        http_request: columns[HTTP_REQUEST..].join(" "),
    })
}

/// Reads raw log lines; malformed ones are logged and counted, not fatal.
pub fn read_raw<R: BufRead>(reader: R) -> Result<LogBatch> {
    let mut batch = LogBatch::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(row) => batch.rows.push(row),
            Err(err) => {
                warn!("Skipping line {}: {err}", line_no + 1);
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}

/// Reads a processed-log CSV written by [`write_processed`].
pub fn read_processed<R: Read>(reader: R) -> Result<LogBatch> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut batch = LogBatch::default();

    for (row_no, result) in reader.deserialize::<LogRow>().enumerate() {
        match result {
            Ok(row) => batch.rows.push(row),
            Err(err) => {
                warn!("Skipping CSV row {row_no}: {err}");
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}

pub fn write_processed<W: Write>(writer: W, rows: &[LogRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row).context("writing log row")?;
    }
    writer.flush().context("flushing processed logs")?;
    Ok(())
}

/// Loads a log file. Dispatch by extension: `.csv` is a processed log,
/// anything else is a raw proxy log.
pub fn load_file(path: &Path) -> Result<LogBatch> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let batch = if is_csv {
        read_processed(file)
    } else {
        read_raw(BufReader::new(file))
    }
    .with_context(|| format!("reading {}", path.display()))?;

    debug!(
        "{}: {} rows, {} skipped",
        path.display(),
        batch.rows.len(),
        batch.skipped
    );
    Ok(batch)
}

/// Regular files directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
