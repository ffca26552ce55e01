//! Error types for scanning, inventory lookups and the access log.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that prevent a scan from starting at all.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root does not exist, is not a directory, or cannot be listed.
    #[error("Root unavailable: {path}: {reason}")]
    RootUnavailable { path: PathBuf, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create a root-unavailable error from an I/O failure.
    pub fn root_io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::RootUnavailable {
            path: path.into(),
            reason: source.to_string(),
        }
    }
}

/// A per-node failure met while walking beneath the root.
///
/// These are recovered locally: logged, counted, and the walk moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum WalkFailure {
    /// Metadata for an entry could not be read.
    #[error("Entry unreadable: {path}: {reason}")]
    EntryUnreadable { path: PathBuf, reason: String },

    /// A directory could not be listed; its children are skipped.
    #[error("Directory unlistable: {path}: {reason}")]
    DirectoryUnlistable { path: PathBuf, reason: String },
}

impl WalkFailure {
    /// Create an unreadable-entry failure.
    pub fn unreadable(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::EntryUnreadable {
            path: path.into(),
            reason: error.to_string(),
        }
    }

    /// Create an unlistable-directory failure.
    pub fn unlistable(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::DirectoryUnlistable {
            path: path.into(),
            reason: error.to_string(),
        }
    }

    /// Path the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::EntryUnreadable { path, .. } | Self::DirectoryUnlistable { path, .. } => path,
        }
    }

    /// Underlying reason string.
    pub fn reason(&self) -> &str {
        match self {
            Self::EntryUnreadable { reason, .. } | Self::DirectoryUnlistable { reason, .. } => {
                reason
            }
        }
    }
}

/// Errors from inventory lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// No entry with this path is held by the inventory.
    #[error("Entry not found: {path}")]
    EntryNotFound { path: PathBuf },
}

/// Errors opening the access log sink.
#[derive(Debug, Error)]
pub enum LogError {
    /// The log file could not be opened for appending.
    #[error("Log sink unavailable: {path}: {source}")]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
