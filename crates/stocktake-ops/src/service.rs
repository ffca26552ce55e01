//! Validated rename and chmod that keep the inventory in step with disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;

use stocktake_core::{AccessLog, EntryReader, Inventory, LogKind};

use crate::chmod::{parse_permission_string, set_mode};
use crate::rename::{sibling_path, validate_filename};
use crate::MutationError;

/// Which field of an entry a mutation changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum MutationKind {
    Rename,
    Chmod,
}

/// A requested change to one inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Give the entry a new name in the same directory.
    Rename { new_name: String },
    /// Set permissions from a 10-character listing string.
    Chmod { permissions: String },
}

impl Mutation {
    /// Create a rename mutation.
    pub fn rename(new_name: impl Into<String>) -> Self {
        Self::Rename {
            new_name: new_name.into(),
        }
    }

    /// Create a chmod mutation.
    pub fn chmod(permissions: impl Into<String>) -> Self {
        Self::Chmod {
            permissions: permissions.into(),
        }
    }

    /// Kind of this mutation.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Rename { .. } => MutationKind::Rename,
            Self::Chmod { .. } => MutationKind::Chmod,
        }
    }
}

/// Applies mutations on disk, then refreshes the affected entry in place.
///
/// Every attempt is journaled: `MODIFIED` on success, `FAILED` with the
/// reason otherwise. A refreshed entry keeps its position in the
/// inventory; ordering is only restored by the next scan.
///
/// Callers must not run a scan against the same inventory concurrently.
#[derive(Debug)]
pub struct MutationService {
    log: Arc<AccessLog>,
    reader: EntryReader,
}

impl MutationService {
    /// Create a service rounding allocated sizes to `block_size`.
    pub fn new(log: Arc<AccessLog>, block_size: u64) -> Self {
        Self::with_reader(log, EntryReader::new(block_size))
    }

    /// Create a service with an explicit entry reader.
    pub fn with_reader(log: Arc<AccessLog>, reader: EntryReader) -> Self {
        Self { log, reader }
    }

    /// Apply `mutation` to the entry at `path`. Returns the entry's path
    /// afterwards.
    pub fn apply(
        &mut self,
        inventory: &mut Inventory,
        path: &Path,
        mutation: &Mutation,
    ) -> Result<PathBuf, MutationError> {
        match mutation {
            Mutation::Rename { new_name } => self.rename(inventory, path, new_name),
            Mutation::Chmod { permissions } => {
                self.chmod(inventory, path, permissions)?;
                Ok(path.to_path_buf())
            }
        }
    }

    /// Rename the entry at `path` to `new_name` within its directory.
    pub fn rename(
        &mut self,
        inventory: &mut Inventory,
        path: &Path,
        new_name: &str,
    ) -> Result<PathBuf, MutationError> {
        let result = self.apply_rename(inventory, path, new_name);
        let detail = match &result {
            Ok(target) => format!("renamed to {}", target.display()),
            Err(err) => err.to_string(),
        };
        self.journal(MutationKind::Rename, path, result.is_ok(), &detail);
        result
    }

    /// Set the permissions of the entry at `path` from a listing string.
    pub fn chmod(
        &mut self,
        inventory: &mut Inventory,
        path: &Path,
        permissions: &str,
    ) -> Result<(), MutationError> {
        let result = self.apply_chmod(inventory, path, permissions);
        let detail = match &result {
            Ok(rendered) => format!("permissions now {rendered}"),
            Err(err) => err.to_string(),
        };
        self.journal(MutationKind::Chmod, path, result.is_ok(), &detail);
        result.map(|_| ())
    }

    fn apply_rename(
        &mut self,
        inventory: &mut Inventory,
        path: &Path,
        new_name: &str,
    ) -> Result<PathBuf, MutationError> {
        if inventory.find_by_path(path).is_none() {
            return Err(MutationError::EntryNotFound {
                path: path.to_path_buf(),
            });
        }

        validate_filename(new_name).map_err(|reason| MutationError::RenameFailed {
            path: path.to_path_buf(),
            reason,
        })?;

        let target = sibling_path(path, new_name);
        if target != path
            && (inventory.find_by_path(&target).is_some()
                || std::fs::symlink_metadata(&target).is_ok())
        {
            return Err(MutationError::TargetExists { path: target });
        }

        std::fs::rename(path, &target).map_err(|e| MutationError::RenameFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let entry = self
            .reader
            .read(&target)
            .map_err(|e| MutationError::RenameFailed {
                path: target.clone(),
                reason: format!("renamed, but metadata is unreadable: {e}"),
            })?;
        inventory.refresh(path, entry)?;

        Ok(target)
    }

    fn apply_chmod(
        &mut self,
        inventory: &mut Inventory,
        path: &Path,
        permissions: &str,
    ) -> Result<String, MutationError> {
        let mode = parse_permission_string(permissions)?;

        let entry = inventory
            .find_by_path(path)
            .ok_or_else(|| MutationError::EntryNotFound {
                path: path.to_path_buf(),
            })?;
        if entry.kind().is_symlink() {
            return Err(MutationError::ChmodFailed {
                path: path.to_path_buf(),
                reason: "symbolic links have no permissions of their own".to_string(),
            });
        }

        let chmod_failed = |e: std::io::Error| MutationError::ChmodFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        set_mode(path, mode).map_err(chmod_failed)?;
        let refreshed = self.reader.read(path).map_err(chmod_failed)?;

        let rendered = refreshed.permissions.to_string();
        inventory.refresh(path, refreshed)?;
        Ok(rendered)
    }

    fn journal(&self, kind: MutationKind, path: &Path, succeeded: bool, detail: &str) {
        let operation = kind.to_string();
        if succeeded {
            tracing::info!(path = %path.display(), %operation, detail, "mutation applied");
            self.log.record(LogKind::Modified, path, &operation, detail);
        } else {
            tracing::warn!(path = %path.display(), %operation, detail, "mutation failed");
            self.log.record(LogKind::Failed, path, &operation, detail);
        }
    }
}
