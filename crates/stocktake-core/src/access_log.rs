//! Append-only journal of unreadable entries and mutations.
//!
//! The sink is chosen once when the log is opened. If the log file cannot
//! be opened, every line for the rest of the session goes to stdout; the
//! file is never retried.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{LogError, WalkFailure};

/// Log file used when the host does not pick one.
pub const DEFAULT_LOG_PATH: &str = "stocktake_access.log";

/// Tag written in front of every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogKind {
    /// Metadata for an entry could not be read.
    Unreadable,
    /// A directory could not be listed.
    Unlistable,
    /// A mutation succeeded.
    Modified,
    /// A mutation failed.
    Failed,
}

/// One journal line.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub timestamp: DateTime<Local>,
    pub kind: LogKind,
    pub operation: String,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for AccessLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.kind,
            self.operation,
            self.path.display(),
            self.message
        )
    }
}

enum Sink {
    File {
        path: PathBuf,
        writer: LineWriter<File>,
    },
    Console,
}

/// Append-only access journal shared by the walker and the mutation service.
pub struct AccessLog {
    sink: Mutex<Sink>,
}

impl AccessLog {
    /// Open `path` for appending, failing if it cannot be opened.
    pub fn try_open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::SinkUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            sink: Mutex::new(Sink::File {
                path: path.to_path_buf(),
                writer: LineWriter::new(file),
            }),
        })
    }

    /// Open `path` for appending, degrading to stdout for the whole
    /// session if it cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Self {
        match Self::try_open(path) {
            Ok(log) => log,
            Err(err) => {
                tracing::warn!(error = %err, "access log falling back to stdout");
                Self::console()
            }
        }
    }

    /// Log to stdout.
    pub fn console() -> Self {
        Self {
            sink: Mutex::new(Sink::Console),
        }
    }

    /// Path of the backing file, or `None` when writing to stdout.
    pub fn file_path(&self) -> Option<PathBuf> {
        match &*self.lock() {
            Sink::File { path, .. } => Some(path.clone()),
            Sink::Console => None,
        }
    }

    /// Append one timestamped line.
    pub fn record(&self, kind: LogKind, path: &Path, operation: &str, detail: impl fmt::Display) {
        let entry = AccessLogEntry {
            timestamp: Local::now(),
            kind,
            operation: operation.to_string(),
            path: path.to_path_buf(),
            message: detail.to_string(),
        };
        self.write_entry(&entry);
    }

    /// Journal a failure met while walking.
    pub fn record_failure(&self, failure: &WalkFailure) {
        let (kind, operation) = match failure {
            WalkFailure::EntryUnreadable { .. } => (LogKind::Unreadable, "stat"),
            WalkFailure::DirectoryUnlistable { .. } => (LogKind::Unlistable, "list"),
        };
        self.record(kind, failure.path(), operation, failure.reason());
    }

    fn write_entry(&self, entry: &AccessLogEntry) {
        let mut sink = self.lock();
        match &mut *sink {
            Sink::File { path, writer } => {
                if let Err(err) = writeln!(writer, "{entry}") {
                    tracing::warn!(path = %path.display(), error = %err, "access log write failed");
                }
            }
            Sink::Console => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{entry}");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for AccessLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessLog")
            .field("file", &self.file_path())
            .finish()
    }
}
