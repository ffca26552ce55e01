//! Inventory entries and the metadata reader that builds them.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::format::{self, ReferenceYear};

/// Type of a filesystem object, decoded from its raw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl EntryKind {
    /// Classify the file type bits of a raw mode.
    pub fn from_mode(raw_mode: u32) -> Self {
        match raw_mode & format::S_IFMT {
            format::S_IFREG => Self::File,
            format::S_IFDIR => Self::Directory,
            format::S_IFLNK => Self::Symlink,
            format::S_IFBLK => Self::BlockDevice,
            format::S_IFCHR => Self::CharDevice,
            format::S_IFIFO => Self::Fifo,
            format::S_IFSOCK => Self::Socket,
            _ => Self::Unknown,
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Check if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }
}

/// One filesystem object's collected and formatted metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Absolute path; unique within one inventory.
    pub path: PathBuf,

    /// Final path component, for display.
    pub name: CompactString,

    /// Whether the object is a directory. Symlinks to directories are not.
    pub is_dir: bool,

    /// File type and permission bits.
    pub raw_mode: u32,

    /// Size reported by the filesystem. For directories this is the
    /// directory's own size, never the sum of its contents.
    pub actual_size: u64,

    /// `actual_size` rounded up to the block size.
    pub allocated_size: u64,

    /// Last modification time.
    pub modified_at: SystemTime,

    /// Ten-character `ls -l` permission string.
    pub permissions: CompactString,

    /// `ls -l` style modification date.
    pub date: CompactString,
}

impl Entry {
    /// Type of this entry.
    pub fn kind(&self) -> EntryKind {
        EntryKind::from_mode(self.raw_mode)
    }

    /// Permission bits only (including setuid, setgid and sticky).
    pub fn mode_bits(&self) -> u32 {
        self.raw_mode & 0o7777
    }

    /// `"actual/allocated"` size pair.
    pub fn size_display(&self) -> String {
        format::size_display(self.actual_size, self.allocated_size)
    }
}

/// Builds [`Entry`] values from filesystem metadata.
///
/// Metadata is always read without following symbolic links. The walker
/// and the mutation service share this so a refreshed entry is built the
/// same way as a scanned one.
#[derive(Debug, Clone)]
pub struct EntryReader {
    block_size: u64,
    reference_year: ReferenceYear,
}

impl EntryReader {
    /// Create a reader tracking the current local year.
    pub fn new(block_size: u64) -> Self {
        Self::with_reference_year(block_size, ReferenceYear::new())
    }

    /// Create a reader with an explicit reference year source.
    pub fn with_reference_year(block_size: u64, reference_year: ReferenceYear) -> Self {
        Self {
            block_size,
            reference_year,
        }
    }

    /// Allocation unit used for allocated sizes.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Stat `path` without following symlinks and build its entry.
    pub fn read(&mut self, path: &Path) -> std::io::Result<Entry> {
        let metadata = std::fs::symlink_metadata(path)?;
        Ok(self.from_metadata(path.to_path_buf(), &metadata))
    }

    /// Build an entry from metadata already obtained for `path`.
    pub fn from_metadata(&mut self, path: PathBuf, metadata: &Metadata) -> Entry {
        let raw_mode = raw_mode(metadata);
        let actual_size = metadata.len();
        let modified_at = metadata.modified().unwrap_or(UNIX_EPOCH);
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(path.to_string_lossy()));

        Entry {
            name,
            is_dir: metadata.file_type().is_dir(),
            raw_mode,
            actual_size,
            allocated_size: format::allocated_size(actual_size, self.block_size),
            modified_at,
            permissions: format::permission_string(raw_mode).into(),
            date: format::date_string(modified_at, self.reference_year.get()).into(),
            path,
        }
    }
}

// Cross-platform metadata helpers

/// Get the raw type and permission bits.
#[cfg(unix)]
fn raw_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn raw_mode(metadata: &Metadata) -> u32 {
    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        format::S_IFDIR
    } else if file_type.is_symlink() {
        format::S_IFLNK
    } else {
        format::S_IFREG
    };
    let perms = if metadata.permissions().readonly() {
        0o555
    } else {
        0o755
    };
    kind | perms
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_kind_from_mode() {
        assert_eq!(EntryKind::from_mode(format::S_IFDIR | 0o755), EntryKind::Directory);
        assert_eq!(EntryKind::from_mode(format::S_IFREG | 0o644), EntryKind::File);
        assert_eq!(EntryKind::from_mode(format::S_IFLNK | 0o777), EntryKind::Symlink);
        assert_eq!(EntryKind::from_mode(0), EntryKind::Unknown);
    }

    #[test]
    fn test_read_file_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, vec![0u8; 4096]).unwrap();

        let mut reader = EntryReader::new(4096);
        let entry = reader.read(&path).unwrap();

        assert_eq!(entry.name.as_str(), "a.txt");
        assert!(!entry.is_dir);
        assert_eq!(entry.actual_size, 4096);
        assert_eq!(entry.size_display(), "4096/4096");
        assert_eq!(entry.permissions.len(), 10);
        assert!(entry.permissions.starts_with('-'));
    }

    #[test]
    fn test_read_empty_file_allocates_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, b"").unwrap();

        let entry = EntryReader::new(4096).read(&path).unwrap();
        assert_eq!(entry.actual_size, 0);
        assert_eq!(entry.allocated_size, 0);
    }

    #[test]
    fn test_read_missing_path_errors() {
        let temp = TempDir::new().unwrap();
        let mut reader = EntryReader::new(4096);
        assert!(reader.read(&temp.path().join("nope")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_not_followed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(temp.path().join("real"), &link).unwrap();

        let entry = EntryReader::new(4096).read(&link).unwrap();
        assert!(!entry.is_dir);
        assert_eq!(entry.kind(), EntryKind::Symlink);
        assert!(entry.permissions.starts_with('l'));
    }
}
