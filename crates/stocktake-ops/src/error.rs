//! Mutation error types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stocktake_core::InventoryError;
use thiserror::Error;

/// Why a rename or chmod was refused or failed.
///
/// Always surfaced to the caller, and always journaled as `FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MutationError {
    /// The inventory holds no entry at this path.
    #[error("Entry not found: {path}")]
    EntryNotFound { path: PathBuf },

    /// The rename destination is already taken.
    #[error("Target already exists: {path}")]
    TargetExists { path: PathBuf },

    /// The permission string does not follow the listing grammar.
    #[error("Invalid permission format '{value}': {reason}")]
    InvalidPermissionFormat { value: String, reason: String },

    /// The rename was rejected or the syscall failed.
    #[error("Rename failed: {reason}")]
    RenameFailed { path: PathBuf, reason: String },

    /// The permission change was rejected or the syscall failed.
    #[error("Chmod failed: {reason}")]
    ChmodFailed { path: PathBuf, reason: String },
}

impl MutationError {
    pub(crate) fn invalid_format(value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPermissionFormat {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<InventoryError> for MutationError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::EntryNotFound { path } => Self::EntryNotFound { path },
        }
    }
}
