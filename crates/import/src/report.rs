//! Append-only record of messages that did not make it into the sink.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use momo_core::RejectionReason;

const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Why a message was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(RejectionReason),
    SinkFailed(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Invalid(reason) => write!(f, "{reason}"),
            Rejection::SinkFailed(err) => write!(f, "Error storing transaction: {err}"),
        }
    }
}

impl From<RejectionReason> for Rejection {
    fn from(reason: RejectionReason) -> Self {
        Rejection::Invalid(reason)
    }
}

/// Receives one call per dropped message, in processing order.
/// Implementations must not fail the batch.
pub trait RejectionReporter: Send + Sync {
    fn report(&self, seq: usize, body: &str, rejection: &Rejection);
}

/// Format one log line: `<timestamp> - <reason>: <body>`.
pub fn format_entry(timestamp: &str, body: &str, rejection: &Rejection) -> String {
    let flat: String = body
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("{timestamp} - {rejection}: {flat}")
}

// ── File log ──────────────────────────────────────────────────────────────────

pub struct FileRejectionLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileRejectionLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RejectionReporter for FileRejectionLog {
    fn report(&self, seq: usize, body: &str, rejection: &Rejection) {
        let timestamp = Local::now().format(LOG_TIMESTAMP_FORMAT).to_string();
        let line = format_entry(&timestamp, body, rejection);
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(seq, path = %self.path.display(), "failed to write rejection log: {e}");
        }
    }
}

// ── In-memory log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionEntry {
    pub seq: usize,
    pub body: String,
    pub rejection: Rejection,
}

#[derive(Debug, Default)]
pub struct MemoryRejectionLog {
    entries: Mutex<Vec<RejectionEntry>>,
}

impl MemoryRejectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RejectionEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl RejectionReporter for MemoryRejectionLog {
    fn report(&self, seq: usize, body: &str, rejection: &Rejection) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(RejectionEntry {
            seq,
            body: body.to_string(),
            rejection: rejection.clone(),
        });
    }
}
